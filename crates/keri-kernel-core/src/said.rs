//! Self-addressing identifiers.
//!
//! A SAID is the Blake3 digest of a body serialized with its own digest
//! field(s) held at a same-length placeholder, then substituted back in.
//! The version string's size field is computed the same way: serialize with
//! a placeholder of the final width, measure, then fill it in.

use serde_json::{Map, Value};

use crate::crypto::Blake3Hash;
use crate::error::EventError;
use crate::version::{Kind, Version, KERI};

/// Placeholder for a 44-character digest.
pub const SAID_PLACEHOLDER: &str = "############################################";

/// Field holding the body's own digest.
pub const SAID_LABEL: &str = "d";

/// Serialize a body in the given kind.
pub fn serialize(body: &Map<String, Value>, kind: Kind) -> Result<Vec<u8>, EventError> {
    match kind {
        Kind::Json => Ok(serde_json::to_vec(body)?),
        Kind::Cbor => {
            let mut out = Vec::new();
            ciborium::into_writer(body, &mut out)
                .map_err(|e| EventError::Serialization(e.to_string()))?;
            Ok(out)
        }
        other => Err(EventError::UnsupportedKind(other.to_string())),
    }
}

/// Deserialize a body in the given kind.
pub fn deserialize(raw: &[u8], kind: Kind) -> Result<Map<String, Value>, EventError> {
    let value: Value = match kind {
        Kind::Json => serde_json::from_slice(raw)?,
        Kind::Cbor => {
            ciborium::from_reader(raw).map_err(|e| EventError::Serialization(e.to_string()))?
        }
        other => return Err(EventError::UnsupportedKind(other.to_string())),
    };
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(EventError::NotAnObject),
    }
}

/// Set the body's version string with the correct size, placing `v` first.
///
/// Keeps the protocol of an existing version string, defaulting to KERI.
pub fn versify(body: &mut Map<String, Value>, kind: Kind) -> Result<Version, EventError> {
    let protocol = body
        .get("v")
        .and_then(Value::as_str)
        .and_then(|v| Version::parse(v).ok())
        .map(|v| v.protocol)
        .unwrap_or_else(|| KERI.to_string());

    let mut version = Version::legacy(&protocol, kind, 0);
    let mut ordered = Map::with_capacity(body.len() + 1);
    ordered.insert("v".to_string(), Value::String(version.render()?));
    for (k, v) in std::mem::take(body) {
        if k != "v" {
            ordered.insert(k, v);
        }
    }

    version.size = serialize(&ordered, kind)?.len();
    ordered.insert("v".to_string(), Value::String(version.render()?));
    *body = ordered;
    Ok(version)
}

/// Compute the SAID of `body` over the given digest labels, and write it into
/// each of them. The version string is refreshed first.
pub fn saidify(
    body: &mut Map<String, Value>,
    kind: Kind,
    labels: &[&str],
) -> Result<String, EventError> {
    for label in labels {
        body.insert(
            label.to_string(),
            Value::String(SAID_PLACEHOLDER.to_string()),
        );
    }
    versify(body, kind)?;

    let said = Blake3Hash::hash(&serialize(body, kind)?).to_qb64();
    for label in labels {
        body.insert(label.to_string(), Value::String(said.clone()));
    }
    Ok(said)
}

/// Digest labels of a received body: `d`, plus `i` when the identifier is
/// self-addressing.
pub fn said_labels(body: &Map<String, Value>) -> Vec<&'static str> {
    let d = body.get(SAID_LABEL).and_then(Value::as_str);
    let i = body.get("i").and_then(Value::as_str);
    match (d, i) {
        (Some(d), Some(i)) if d == i => vec![SAID_LABEL, "i"],
        _ => vec![SAID_LABEL],
    }
}

/// Recompute the SAID of a received body and check it against its `d`.
pub fn verify_said(raw: &[u8], kind: Kind) -> Result<String, EventError> {
    let body = deserialize(raw, kind)?;
    let expected = body
        .get(SAID_LABEL)
        .and_then(Value::as_str)
        .ok_or(EventError::MissingField("d"))?
        .to_string();

    let labels = said_labels(&body);
    let mut copy = body;
    for label in &labels {
        copy.insert(
            label.to_string(),
            Value::String(SAID_PLACEHOLDER.to_string()),
        );
    }
    let computed = Blake3Hash::hash(&serialize(&copy, kind)?).to_qb64();

    if computed != expected {
        return Err(EventError::SaidMismatch { expected, computed });
    }
    Ok(computed)
}
