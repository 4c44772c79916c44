//! DateTime primitives.
//!
//! An ISO-8601 timestamp with microseconds and offset becomes valid base64
//! once the three forbidden characters are substituted (`:`→`c`, `.`→`d`,
//! `+`→`p`), so the text itself is the primitive body.

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeZone};

use crate::codes::matter;
use crate::error::CodecError;

/// Format a timestamp the way key events carry it: microsecond precision
/// with an explicit `+00:00`-style offset.
pub fn format_datetime<Tz: TimeZone>(ts: &DateTime<Tz>) -> String {
    ts.fixed_offset()
        .to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Encode a timestamp as a `DateTime` primitive.
pub fn encode_date<Tz: TimeZone>(ts: &DateTime<Tz>) -> String {
    let body: String = format_datetime(ts)
        .chars()
        .map(|c| match c {
            ':' => 'c',
            '.' => 'd',
            '+' => 'p',
            other => other,
        })
        .collect();
    format!("{}{body}", matter::DATE_TIME)
}

/// Decode a `DateTime` primitive.
pub fn decode_date(text: &str) -> Result<DateTime<FixedOffset>, CodecError> {
    let body = text
        .strip_prefix(matter::DATE_TIME)
        .ok_or_else(|| CodecError::InvalidDate(format!("missing date code: {text}")))?;
    if body.len() != 32 {
        return Err(CodecError::InvalidDate(format!(
            "expected 32 characters, got {}",
            body.len()
        )));
    }
    let iso: String = body
        .chars()
        .map(|c| match c {
            'c' => ':',
            'd' => '.',
            'p' => '+',
            other => other,
        })
        .collect();
    DateTime::parse_from_rfc3339(&iso).map_err(|e| CodecError::InvalidDate(e.to_string()))
}
