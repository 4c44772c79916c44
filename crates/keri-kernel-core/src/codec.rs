//! Primitive codec.
//!
//! Lossless, exact-length mapping between `(code, raw bytes)` and the
//! self-framing text form. A fixed-size primitive is its code followed by the
//! base64url body, with the encoded pad characters replaced by the code, so
//! the whole text is always a multiple of four characters.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use crate::b64::{b64_to_int, int_to_b64, max_for_width};
use crate::codes::{CodeEntry, CURRENT_ONLY, COUNTER, INDEXER, INDEX_PAIRS, MATTER};
use crate::error::CodecError;

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;

/// A decoded plain primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Primitive {
    pub code: &'static str,
    pub raw: Vec<u8>,
}

/// A decoded indexed signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedPrimitive {
    pub code: &'static str,
    /// Position of the signing key in the current key list.
    pub index: u64,
    /// Position of the signing key in the prior next-key list, when the code
    /// commits to one.
    pub ondex: Option<u64>,
    pub raw: Vec<u8>,
}

/// Result of [`deindex`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deindexed {
    pub index: u64,
    pub ondex: Option<u64>,
    /// The plain (unindexed) signature text.
    pub value: String,
}

/// A decoded counter: a group code and the number of items it introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterFrame {
    pub code: &'static str,
    pub count: u64,
}

fn slice<'a>(text: &'a str, start: usize, end: usize, code: &str) -> Result<&'a str> {
    text.get(start..end).ok_or_else(|| {
        CodecError::invalid_size(
            code,
            format!("need {end} characters, have {}", text.len()),
        )
    })
}

/// Left-pad `raw` with `lead` zero bytes and base64url-encode it, dropping the
/// first `drop` characters.
fn encode_body(raw: &[u8], lead: usize, drop: usize) -> String {
    let mut padded = vec![0u8; lead];
    padded.extend_from_slice(raw);
    let mut body = URL_SAFE_NO_PAD.encode(&padded);
    body.replace_range(..drop, "");
    body
}

/// Decode a body that had `ps` characters replaced by the code, dropping
/// `ps + ls` leading bytes. The dropped bytes must be zero.
fn decode_body(body: &str, ps: usize, ls: usize, code: &str) -> Result<Vec<u8>> {
    let mut padded = String::with_capacity(ps + body.len());
    padded.extend(std::iter::repeat('A').take(ps));
    padded.push_str(body);

    let bytes = URL_SAFE_NO_PAD
        .decode(padded.as_bytes())
        .map_err(|e| CodecError::InvalidBase64(e.to_string()))?;

    let lead = ps + ls;
    if bytes.len() < lead {
        return Err(CodecError::invalid_size(code, "body shorter than lead"));
    }
    if bytes[..lead].iter().any(|b| *b != 0) {
        return Err(CodecError::NonZeroPad(code.to_string()));
    }
    Ok(bytes[lead..].to_vec())
}

fn matter_entry(code: &str) -> Result<&'static CodeEntry> {
    MATTER
        .get(code)
        .ok_or_else(|| CodecError::UnknownCode(code.to_string()))
}

/// Encode `raw` under a Matter code.
///
/// For variable-size codes the soft part carries the body length in
/// quadlets, so the output decodes without outside framing.
pub fn encode(code: &str, raw: &[u8]) -> Result<String> {
    let entry = matter_entry(code)?;
    let sz = entry.sizage;
    let cs = sz.cs();

    match sz.fs {
        Some(fs) => {
            let ps = (3 - (raw.len() + sz.ls) % 3) % 3;
            if ps != cs % 4 {
                return Err(CodecError::invalid_size(
                    code,
                    format!("raw length {} does not align with code size {cs}", raw.len()),
                ));
            }
            let text = format!("{}{}", entry.code, encode_body(raw, ps + sz.ls, ps));
            if text.len() != fs {
                return Err(CodecError::invalid_size(
                    code,
                    format!("encoded {} characters, expected {fs}", text.len()),
                ));
            }
            Ok(text)
        }
        None => {
            if (sz.ls + raw.len()) % 3 != 0 || cs % 4 != 0 {
                return Err(CodecError::invalid_size(
                    code,
                    format!("raw length {} not aligned for lead {}", raw.len(), sz.ls),
                ));
            }
            let body = encode_body(raw, sz.ls, 0);
            let quadlets = (body.len() / 4) as u64;
            let soft = int_to_b64(quadlets, sz.ss).ok_or_else(|| {
                CodecError::invalid_size(code, format!("{quadlets} quadlets exceed soft size"))
            })?;
            Ok(format!("{}{soft}{body}", entry.code))
        }
    }
}

/// Total text length of the Matter primitive at the start of `text`.
///
/// Needs only the code and, for variable codes, the soft size.
pub fn matter_size(text: &str) -> Result<(&'static CodeEntry, usize)> {
    let entry = MATTER
        .match_prefix(text)
        .ok_or_else(|| CodecError::UnknownCode(text.chars().take(4).collect()))?;
    let sz = entry.sizage;
    let size = match sz.fs {
        Some(fs) => fs,
        None => {
            let soft = slice(text, sz.hs, sz.cs(), entry.code)?;
            sz.cs() + b64_to_int(soft)? as usize * 4
        }
    };
    Ok((entry, size))
}

/// Decode a single Matter primitive.
pub fn decode(text: &str) -> Result<Primitive> {
    let (entry, size) = matter_size(text)?;
    if text.len() != size {
        return Err(CodecError::invalid_size(
            entry.code,
            format!("expected {size} characters, got {}", text.len()),
        ));
    }
    let sz = entry.sizage;
    let cs = sz.cs();
    let body = slice(text, cs, size, entry.code)?;
    let raw = decode_body(body, cs % 4, sz.ls, entry.code)?;
    Ok(Primitive {
        code: entry.code,
        raw,
    })
}

fn is_current_only(code: &str) -> bool {
    CURRENT_ONLY.iter().any(|(c, _)| *c == code)
}

/// Encode an indexed signature.
///
/// `ondex` defaults to `index` for codes that carry one. Small codes have no
/// ondex field; their ondex is the index, and any other value is rejected.
pub fn encode_indexed(code: &str, index: u64, ondex: Option<u64>, raw: &[u8]) -> Result<String> {
    let entry = INDEXER
        .get(code)
        .ok_or_else(|| CodecError::UnknownCode(code.to_string()))?;
    let sz = entry.sizage;
    let cs = sz.cs();
    let ms = sz.ss - sz.xs;
    let out_of_range = |index| CodecError::IndexOutOfRange {
        code: code.to_string(),
        index,
    };

    let index_text = int_to_b64(index, ms).ok_or_else(|| out_of_range(index))?;
    let ondex_text = if sz.xs == 0 {
        match ondex {
            Some(o) if o != index && !is_current_only(code) => return Err(out_of_range(o)),
            _ => String::new(),
        }
    } else {
        let value = if is_current_only(code) {
            0
        } else {
            ondex.unwrap_or(index)
        };
        int_to_b64(value, sz.xs).ok_or_else(|| out_of_range(value))?
    };

    let ps = (3 - raw.len() % 3) % 3;
    if ps != cs % 4 {
        return Err(CodecError::invalid_size(
            code,
            format!("raw length {} does not align with code size {cs}", raw.len()),
        ));
    }
    let text = format!("{}{index_text}{ondex_text}{}", entry.code, encode_body(raw, ps, ps));
    if Some(text.len()) != sz.fs {
        return Err(CodecError::invalid_size(
            code,
            format!("encoded {} characters, expected {:?}", text.len(), sz.fs),
        ));
    }
    Ok(text)
}

/// Decode an indexed signature.
pub fn decode_indexed(text: &str) -> Result<IndexedPrimitive> {
    let entry = INDEXER
        .match_prefix(text)
        .ok_or_else(|| CodecError::UnknownCode(text.chars().take(4).collect()))?;
    let sz = entry.sizage;
    let cs = sz.cs();
    let fs = sz.fs.unwrap_or(cs);
    if text.len() != fs {
        return Err(CodecError::invalid_size(
            entry.code,
            format!("expected {fs} characters, got {}", text.len()),
        ));
    }

    let ms = sz.ss - sz.xs;
    let index = b64_to_int(slice(text, sz.hs, sz.hs + ms, entry.code)?)?;
    let ondex = if is_current_only(entry.code) {
        None
    } else if sz.xs == 0 {
        Some(index)
    } else {
        Some(b64_to_int(slice(text, sz.hs + ms, cs, entry.code)?)?)
    };

    let raw = decode_body(slice(text, cs, fs, entry.code)?, cs % 4, 0, entry.code)?;
    Ok(IndexedPrimitive {
        code: entry.code,
        index,
        ondex,
        raw,
    })
}

/// Turn a plain signature into an indexed one for signer `idx`.
///
/// Uses the small indexed code when the index fits and the big one
/// otherwise.
pub fn index(text: &str, idx: u64) -> Result<String> {
    let sig = decode(text)?;
    let (_, small, big) = INDEX_PAIRS
        .iter()
        .find(|(m, _, _)| *m == sig.code)
        .ok_or_else(|| CodecError::NotIndexable(sig.code.to_string()))?;

    for code in [small, big] {
        let fits = INDEXER
            .sizage(code)
            .map(|sz| idx <= max_for_width(sz.ss - sz.xs))
            .unwrap_or(false);
        if fits {
            return encode_indexed(code, idx, None, &sig.raw);
        }
    }
    Err(CodecError::IndexOutOfRange {
        code: big.to_string(),
        index: idx,
    })
}

/// Reverse of [`index`]: recover the signer index and the plain signature.
pub fn deindex(text: &str) -> Result<Deindexed> {
    let indexed = decode_indexed(text)?;
    let code = indexed.code;
    let plain = INDEX_PAIRS
        .iter()
        .find(|(_, small, big)| *small == code || *big == code)
        .map(|(m, _, _)| *m)
        .or_else(|| {
            CURRENT_ONLY
                .iter()
                .find(|(c, _)| *c == code)
                .map(|(_, m)| *m)
        })
        .ok_or_else(|| CodecError::NotIndexable(code.to_string()))?;

    Ok(Deindexed {
        index: indexed.index,
        ondex: indexed.ondex,
        value: encode(plain, &indexed.raw)?,
    })
}

/// Encode a counter for `count` items.
pub fn encode_counter(code: &str, count: u64) -> Result<String> {
    let entry = COUNTER
        .get(code)
        .ok_or_else(|| CodecError::UnknownCode(code.to_string()))?;
    let soft = int_to_b64(count, entry.sizage.ss).ok_or_else(|| {
        CodecError::invalid_size(code, format!("count {count} exceeds soft size"))
    })?;
    Ok(format!("{}{soft}", entry.code))
}

/// Decode a counter.
pub fn decode_counter(text: &str) -> Result<CounterFrame> {
    let entry = COUNTER
        .match_prefix(text)
        .ok_or_else(|| CodecError::UnknownCode(text.chars().take(4).collect()))?;
    let sz = entry.sizage;
    let fs = sz.fs.unwrap_or(sz.cs());
    if text.len() != fs {
        return Err(CodecError::invalid_size(
            entry.code,
            format!("expected {fs} characters, got {}", text.len()),
        ));
    }
    let count = b64_to_int(slice(text, sz.hs, sz.cs(), entry.code)?)?;
    Ok(CounterFrame {
        code: entry.code,
        count,
    })
}
