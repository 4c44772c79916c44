//! Base64url integer encoding.
//!
//! Soft fields (counts, indexes, sizes) are written as big-endian base64
//! digits over the URL-safe alphabet.

use crate::error::CodecError;

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Value of a single base64url digit.
pub fn b64_digit(c: u8) -> Option<u64> {
    match c {
        b'A'..=b'Z' => Some((c - b'A') as u64),
        b'a'..=b'z' => Some((c - b'a') as u64 + 26),
        b'0'..=b'9' => Some((c - b'0') as u64 + 52),
        b'-' => Some(62),
        b'_' => Some(63),
        _ => None,
    }
}

/// Whether a byte belongs to the base64url alphabet.
pub fn is_b64_char(c: u8) -> bool {
    b64_digit(c).is_some()
}

/// Decode a base64url integer.
///
/// Leading zero digits are allowed at any width; only a value that
/// overflows `u64` is rejected.
pub fn b64_to_int(text: &str) -> Result<u64, CodecError> {
    text.bytes().try_fold(0u64, |acc, c| {
        let d = b64_digit(c).ok_or_else(|| CodecError::InvalidBase64(text.to_string()))?;
        acc.checked_mul(64)
            .and_then(|v| v.checked_add(d))
            .ok_or_else(|| CodecError::InvalidBase64(format!("integer overflows u64: {text}")))
    })
}

/// Encode `value` as exactly `width` base64url digits.
///
/// Returns `None` if the value does not fit.
pub fn int_to_b64(value: u64, width: usize) -> Option<String> {
    if value > max_for_width(width) {
        return None;
    }
    let mut out = vec![b'A'; width];
    let mut v = value;
    for slot in out.iter_mut().rev() {
        *slot = ALPHABET[(v & 0x3f) as usize];
        v >>= 6;
    }
    String::from_utf8(out).ok()
}

/// Largest value representable in `width` base64url digits.
pub fn max_for_width(width: usize) -> u64 {
    if width * 6 >= 64 {
        u64::MAX
    } else {
        (1u64 << (6 * width)) - 1
    }
}
