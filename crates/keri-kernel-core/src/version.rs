//! Version strings.
//!
//! Every serialized body announces its protocol, version, serialization kind
//! and total byte length in a version string at a fixed offset, so a reader
//! knows the exact body length after a short prefix.
//!
//! Two layouts are recognized:
//!
//! ```text
//! legacy: PPPPvvKKKKllllll_   (hex version digits, 6 hex size digits)
//! v2:     PPPPVVVKKKKBBBB.    (base64 version, 4 base64 size digits)
//! ```

use std::fmt;
use std::str::FromStr;

use crate::b64::{b64_to_int, int_to_b64};
use crate::error::CodecError;

/// Protocol tag for key event messages.
pub const KERI: &str = "KERI";

/// Protocol tag for authentic chained data containers.
pub const ACDC: &str = "ACDC";

pub const LEGACY_VERSION_LEN: usize = 17;
pub const V2_VERSION_LEN: usize = 16;

/// Offset of the version string inside a JSON body: `{"v":"`.
pub const JSON_VERSION_OFFSET: usize = 6;

/// Offset of the version string inside a CBOR body: map header, the key
/// `"v"`, and the text-string header.
pub const CBOR_VERSION_OFFSET: usize = 4;

const JSON_PREFIX: &[u8] = b"{\"v\":\"";

/// Serialization kind of a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Json,
    Cbor,
    Mgpk,
    Cesr,
}

impl Kind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Kind::Json => "JSON",
            Kind::Cbor => "CBOR",
            Kind::Mgpk => "MGPK",
            Kind::Cesr => "CESR",
        }
    }
}

impl FromStr for Kind {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "JSON" => Ok(Kind::Json),
            "CBOR" => Ok(Kind::Cbor),
            "MGPK" => Ok(Kind::Mgpk),
            "CESR" => Ok(Kind::Cesr),
            other => Err(CodecError::InvalidVersion(format!("unknown kind {other}"))),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which version-string layout a body uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Legacy,
    V2,
}

/// A parsed version string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub protocol: String,
    pub major: u32,
    pub minor: u32,
    pub kind: Kind,
    /// Total serialized size of the body in bytes.
    pub size: usize,
    pub layout: Layout,
}

impl Version {
    /// A legacy (1.x) version string.
    pub fn legacy(protocol: &str, kind: Kind, size: usize) -> Self {
        Self {
            protocol: protocol.to_string(),
            major: 1,
            minor: 0,
            kind,
            size,
            layout: Layout::Legacy,
        }
    }

    /// Parse a version string in either layout.
    pub fn parse(text: &str) -> Result<Self, CodecError> {
        match text.len() {
            LEGACY_VERSION_LEN if text.ends_with('_') => Self::parse_legacy(text),
            V2_VERSION_LEN if text.ends_with('.') => Self::parse_v2(text),
            _ => Err(CodecError::InvalidVersion(text.to_string())),
        }
    }

    fn parse_legacy(text: &str) -> Result<Self, CodecError> {
        let invalid = || CodecError::InvalidVersion(text.to_string());
        let field = |a: usize, b: usize| text.get(a..b).ok_or_else(invalid);

        let protocol = parse_protocol(field(0, 4)?).ok_or_else(invalid)?;
        let major = u32::from_str_radix(field(4, 5)?, 16).map_err(|_| invalid())?;
        let minor = u32::from_str_radix(field(5, 6)?, 16).map_err(|_| invalid())?;
        let kind = field(6, 10)?.parse()?;
        let size = usize::from_str_radix(field(10, 16)?, 16).map_err(|_| invalid())?;

        Ok(Self {
            protocol,
            major,
            minor,
            kind,
            size,
            layout: Layout::Legacy,
        })
    }

    fn parse_v2(text: &str) -> Result<Self, CodecError> {
        let invalid = || CodecError::InvalidVersion(text.to_string());
        let field = |a: usize, b: usize| text.get(a..b).ok_or_else(invalid);

        let protocol = parse_protocol(field(0, 4)?).ok_or_else(invalid)?;
        let major = b64_to_int(field(4, 5)?)? as u32;
        let minor = b64_to_int(field(5, 7)?)? as u32;
        let kind = field(7, 11)?.parse()?;
        let size = b64_to_int(field(11, 15)?)? as usize;

        Ok(Self {
            protocol,
            major,
            minor,
            kind,
            size,
            layout: Layout::V2,
        })
    }

    /// Whether this body belongs to the key event protocol.
    pub fn is_keri(&self) -> bool {
        self.protocol == KERI
    }

    /// Length of the version string in this layout.
    pub fn text_len(&self) -> usize {
        match self.layout {
            Layout::Legacy => LEGACY_VERSION_LEN,
            Layout::V2 => V2_VERSION_LEN,
        }
    }

    /// Render the version string, or fail if the size does not fit.
    pub fn render(&self) -> Result<String, CodecError> {
        match self.layout {
            Layout::Legacy => {
                if self.size > 0xff_ffff || self.major > 0xf || self.minor > 0xf {
                    return Err(CodecError::InvalidVersion(format!(
                        "size {} does not fit legacy version string",
                        self.size
                    )));
                }
                Ok(format!(
                    "{}{:x}{:x}{}{:06x}_",
                    self.protocol, self.major, self.minor, self.kind, self.size
                ))
            }
            Layout::V2 => {
                let too_big = || {
                    CodecError::InvalidVersion(format!(
                        "size {} does not fit v2 version string",
                        self.size
                    ))
                };
                let major = int_to_b64(self.major as u64, 1).ok_or_else(too_big)?;
                let minor = int_to_b64(self.minor as u64, 2).ok_or_else(too_big)?;
                let size = int_to_b64(self.size as u64, 4).ok_or_else(too_big)?;
                Ok(format!("{}{major}{minor}{}{size}.", self.protocol, self.kind))
            }
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render() {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "{}?{}", self.protocol, self.kind),
        }
    }
}

fn parse_protocol(text: &str) -> Option<String> {
    text.bytes()
        .all(|b| b.is_ascii_uppercase())
        .then(|| text.to_string())
}

/// Whether `b` is a CBOR map header (major type 5).
pub fn is_cbor_map(b: u8) -> bool {
    (0xa0..=0xbf).contains(&b)
}

/// Number of leading bytes needed to sniff the version of a body that starts
/// with `first`, or `None` if `first` cannot start a body.
pub fn sniff_len(first: u8) -> Option<usize> {
    if first == b'{' {
        Some(JSON_VERSION_OFFSET + LEGACY_VERSION_LEN)
    } else if is_cbor_map(first) {
        Some(CBOR_VERSION_OFFSET + LEGACY_VERSION_LEN)
    } else {
        None
    }
}

/// Parse the version string from the head of a serialized body.
///
/// `head` must hold at least [`sniff_len`] bytes.
pub fn sniff(head: &[u8]) -> Result<Version, CodecError> {
    let invalid = || CodecError::InvalidVersion(String::from_utf8_lossy(head).into_owned());

    let first = *head.first().ok_or_else(invalid)?;
    let region = if first == b'{' {
        if !head.starts_with(JSON_PREFIX) {
            return Err(invalid());
        }
        let start = JSON_VERSION_OFFSET;
        match head.get(start + LEGACY_VERSION_LEN - 1) {
            Some(b'_') => head.get(start..start + LEGACY_VERSION_LEN),
            _ => head.get(start..start + V2_VERSION_LEN),
        }
    } else if is_cbor_map(first) {
        // text string of 17 (0x71) or 16 (0x70) bytes under key "v"
        if head.get(1..3) != Some(&[0x61, b'v'][..]) {
            return Err(invalid());
        }
        let start = CBOR_VERSION_OFFSET;
        match head.get(3) {
            Some(0x71) => head.get(start..start + LEGACY_VERSION_LEN),
            Some(0x70) => head.get(start..start + V2_VERSION_LEN),
            _ => None,
        }
    } else {
        None
    };

    let text = region
        .and_then(|r| std::str::from_utf8(r).ok())
        .ok_or_else(invalid)?;
    let version = Version::parse(text)?;

    let expected = match first {
        b'{' => Kind::Json,
        _ => Kind::Cbor,
    };
    if version.kind != expected {
        return Err(CodecError::InvalidVersion(format!(
            "{text} announces {} but body is {expected}",
            version.kind
        )));
    }
    Ok(version)
}
