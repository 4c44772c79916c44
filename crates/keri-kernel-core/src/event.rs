//! Key events.
//!
//! A key event is a versioned body whose `t` field names its kind ("ilk").
//! [`KeyEvent`] is a sum type with one variant per ilk so the reducer can
//! match exhaustively; bodies with an unrecognised or missing `t` (such as
//! credentials) are kept as [`KeyEvent::Other`].
//!
//! Struct fields are declared in wire order, so re-serializing an event
//! reproduces the order its SAID was computed over.

use serde::de::Deserializer;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::EventError;
use crate::said;
use crate::types::{HexNum, Threshold};
use crate::version::{Kind, Version};

/// Event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ilk {
    Icp,
    Dip,
    Rot,
    Drt,
    Ixn,
    Rct,
    Rpy,
    Qry,
    Exn,
    Vcp,
    Iss,
    Rev,
}

impl Ilk {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Ilk::Icp => "icp",
            Ilk::Dip => "dip",
            Ilk::Rot => "rot",
            Ilk::Drt => "drt",
            Ilk::Ixn => "ixn",
            Ilk::Rct => "rct",
            Ilk::Rpy => "rpy",
            Ilk::Qry => "qry",
            Ilk::Exn => "exn",
            Ilk::Vcp => "vcp",
            Ilk::Iss => "iss",
            Ilk::Rev => "rev",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "icp" => Ilk::Icp,
            "dip" => Ilk::Dip,
            "rot" => Ilk::Rot,
            "drt" => Ilk::Drt,
            "ixn" => Ilk::Ixn,
            "rct" => Ilk::Rct,
            "rpy" => Ilk::Rpy,
            "qry" => Ilk::Qry,
            "exn" => Ilk::Exn,
            "vcp" => Ilk::Vcp,
            "iss" => Ilk::Iss,
            "rev" => Ilk::Rev,
            _ => return None,
        })
    }

    /// Whether this ilk may change key or witness commitments.
    pub const fn is_establishment(&self) -> bool {
        matches!(self, Ilk::Icp | Ilk::Dip | Ilk::Rot | Ilk::Drt)
    }
}

impl fmt::Display for Ilk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inception (`icp`) or delegated inception (`dip`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InceptionEvent {
    pub v: String,
    pub t: Ilk,
    pub d: String,
    pub i: String,
    pub s: HexNum,
    pub kt: Threshold,
    pub k: Vec<String>,
    pub nt: Threshold,
    pub n: Vec<String>,
    pub bt: HexNum,
    pub b: Vec<String>,
    #[serde(default)]
    pub c: Vec<String>,
    #[serde(default)]
    pub a: Vec<Value>,
    /// Delegator, for `dip` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub di: Option<String>,
}

/// Rotation (`rot`) or delegated rotation (`drt`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationEvent {
    pub v: String,
    pub t: Ilk,
    pub d: String,
    pub i: String,
    pub s: HexNum,
    pub p: String,
    pub kt: Threshold,
    pub k: Vec<String>,
    pub nt: Threshold,
    pub n: Vec<String>,
    pub bt: HexNum,
    #[serde(default)]
    pub br: Vec<String>,
    #[serde(default)]
    pub ba: Vec<String>,
    #[serde(default)]
    pub a: Vec<Value>,
}

/// Interaction (`ixn`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub v: String,
    pub t: Ilk,
    pub d: String,
    pub i: String,
    pub s: HexNum,
    pub p: String,
    #[serde(default)]
    pub a: Vec<Value>,
}

/// Receipt (`rct`): acknowledges an event by identifier, sequence and digest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptEvent {
    pub v: String,
    pub t: Ilk,
    pub d: String,
    pub i: String,
    pub s: HexNum,
}

/// Reply (`rpy`) to a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyEvent {
    pub v: String,
    pub t: Ilk,
    pub d: String,
    pub dt: String,
    pub r: String,
    #[serde(default)]
    pub a: Value,
}

/// Query (`qry`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryEvent {
    pub v: String,
    pub t: Ilk,
    pub d: String,
    pub dt: String,
    pub r: String,
    #[serde(default)]
    pub rr: String,
    #[serde(default)]
    pub q: Value,
}

/// Peer-to-peer exchange (`exn`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeEvent {
    pub v: String,
    pub t: Ilk,
    pub d: String,
    pub i: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rp: Option<String>,
    #[serde(default)]
    pub p: String,
    pub dt: String,
    pub r: String,
    #[serde(default)]
    pub q: Value,
    #[serde(default)]
    pub a: Value,
    #[serde(default)]
    pub e: Value,
}

/// Registry inception (`vcp`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryInceptionEvent {
    pub v: String,
    pub t: Ilk,
    pub d: String,
    pub i: String,
    pub ii: String,
    pub s: HexNum,
    #[serde(default)]
    pub c: Vec<String>,
    pub bt: HexNum,
    #[serde(default)]
    pub b: Vec<String>,
    #[serde(default)]
    pub n: String,
}

/// Credential issuance (`iss`) or revocation (`rev`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialStatusEvent {
    pub v: String,
    pub t: Ilk,
    pub d: String,
    pub i: String,
    pub s: HexNum,
    pub ri: String,
    /// Prior event digest, for `rev` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<String>,
    pub dt: String,
}

/// A key event body, dispatched on its `t` field.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyEvent {
    Inception(InceptionEvent),
    DelegatedInception(InceptionEvent),
    Rotation(RotationEvent),
    DelegatedRotation(RotationEvent),
    Interaction(InteractionEvent),
    Receipt(ReceiptEvent),
    Reply(ReplyEvent),
    Query(QueryEvent),
    Exchange(ExchangeEvent),
    RegistryInception(RegistryInceptionEvent),
    Issuance(CredentialStatusEvent),
    Revocation(CredentialStatusEvent),
    /// Any body without a recognised `t`, kept verbatim.
    Other(Map<String, Value>),
}

impl KeyEvent {
    /// Dispatch a body on its `t` field.
    pub fn from_map(map: Map<String, Value>) -> Result<Self, serde_json::Error> {
        let ilk = map.get("t").and_then(Value::as_str).and_then(Ilk::parse);
        let Some(ilk) = ilk else {
            return Ok(KeyEvent::Other(map));
        };
        let value = Value::Object(map);
        Ok(match ilk {
            Ilk::Icp => KeyEvent::Inception(serde_json::from_value(value)?),
            Ilk::Dip => KeyEvent::DelegatedInception(serde_json::from_value(value)?),
            Ilk::Rot => KeyEvent::Rotation(serde_json::from_value(value)?),
            Ilk::Drt => KeyEvent::DelegatedRotation(serde_json::from_value(value)?),
            Ilk::Ixn => KeyEvent::Interaction(serde_json::from_value(value)?),
            Ilk::Rct => KeyEvent::Receipt(serde_json::from_value(value)?),
            Ilk::Rpy => KeyEvent::Reply(serde_json::from_value(value)?),
            Ilk::Qry => KeyEvent::Query(serde_json::from_value(value)?),
            Ilk::Exn => KeyEvent::Exchange(serde_json::from_value(value)?),
            Ilk::Vcp => KeyEvent::RegistryInception(serde_json::from_value(value)?),
            Ilk::Iss => KeyEvent::Issuance(serde_json::from_value(value)?),
            Ilk::Rev => KeyEvent::Revocation(serde_json::from_value(value)?),
        })
    }

    /// Decode a serialized body of the given kind.
    pub fn from_slice(raw: &[u8], kind: Kind) -> Result<Self, EventError> {
        Ok(Self::from_map(said::deserialize(raw, kind)?)?)
    }

    /// Convert to a JSON object in wire order.
    pub fn to_map(&self) -> Result<Map<String, Value>, EventError> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Err(EventError::NotAnObject),
        }
    }

    /// Serialize in the kind announced by the version string.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EventError> {
        let kind = self
            .version()
            .map(|v| v.kind)
            .unwrap_or(Kind::Json);
        said::serialize(&self.to_map()?, kind)
    }

    /// The event kind, if recognised.
    pub fn ilk(&self) -> Option<Ilk> {
        Some(match self {
            KeyEvent::Inception(_) => Ilk::Icp,
            KeyEvent::DelegatedInception(_) => Ilk::Dip,
            KeyEvent::Rotation(_) => Ilk::Rot,
            KeyEvent::DelegatedRotation(_) => Ilk::Drt,
            KeyEvent::Interaction(_) => Ilk::Ixn,
            KeyEvent::Receipt(_) => Ilk::Rct,
            KeyEvent::Reply(_) => Ilk::Rpy,
            KeyEvent::Query(_) => Ilk::Qry,
            KeyEvent::Exchange(_) => Ilk::Exn,
            KeyEvent::RegistryInception(_) => Ilk::Vcp,
            KeyEvent::Issuance(_) => Ilk::Iss,
            KeyEvent::Revocation(_) => Ilk::Rev,
            KeyEvent::Other(_) => return None,
        })
    }

    /// The raw `t` field, including unrecognised values.
    pub fn ilk_str(&self) -> &str {
        match self {
            KeyEvent::Other(map) => map.get("t").and_then(Value::as_str).unwrap_or(""),
            other => other.ilk().map(|i| i.as_str()).unwrap_or(""),
        }
    }

    /// The version string field.
    pub fn version_str(&self) -> &str {
        match self {
            KeyEvent::Inception(e) | KeyEvent::DelegatedInception(e) => &e.v,
            KeyEvent::Rotation(e) | KeyEvent::DelegatedRotation(e) => &e.v,
            KeyEvent::Interaction(e) => &e.v,
            KeyEvent::Receipt(e) => &e.v,
            KeyEvent::Reply(e) => &e.v,
            KeyEvent::Query(e) => &e.v,
            KeyEvent::Exchange(e) => &e.v,
            KeyEvent::RegistryInception(e) => &e.v,
            KeyEvent::Issuance(e) | KeyEvent::Revocation(e) => &e.v,
            KeyEvent::Other(map) => map.get("v").and_then(Value::as_str).unwrap_or(""),
        }
    }

    /// The parsed version string, if valid.
    pub fn version(&self) -> Option<Version> {
        Version::parse(self.version_str()).ok()
    }

    /// The event's own digest.
    pub fn said(&self) -> &str {
        match self {
            KeyEvent::Inception(e) | KeyEvent::DelegatedInception(e) => &e.d,
            KeyEvent::Rotation(e) | KeyEvent::DelegatedRotation(e) => &e.d,
            KeyEvent::Interaction(e) => &e.d,
            KeyEvent::Receipt(e) => &e.d,
            KeyEvent::Reply(e) => &e.d,
            KeyEvent::Query(e) => &e.d,
            KeyEvent::Exchange(e) => &e.d,
            KeyEvent::RegistryInception(e) => &e.d,
            KeyEvent::Issuance(e) | KeyEvent::Revocation(e) => &e.d,
            KeyEvent::Other(map) => map.get("d").and_then(Value::as_str).unwrap_or(""),
        }
    }

    /// The identifier prefix, for events that carry one.
    pub fn prefix(&self) -> Option<&str> {
        match self {
            KeyEvent::Inception(e) | KeyEvent::DelegatedInception(e) => Some(&e.i),
            KeyEvent::Rotation(e) | KeyEvent::DelegatedRotation(e) => Some(&e.i),
            KeyEvent::Interaction(e) => Some(&e.i),
            KeyEvent::Receipt(e) => Some(&e.i),
            KeyEvent::Exchange(e) => Some(&e.i),
            KeyEvent::RegistryInception(e) => Some(&e.i),
            KeyEvent::Issuance(e) | KeyEvent::Revocation(e) => Some(&e.i),
            KeyEvent::Other(map) => map.get("i").and_then(Value::as_str),
            KeyEvent::Reply(_) | KeyEvent::Query(_) => None,
        }
    }

    /// Sequence number, for events on a key event log.
    pub fn sn(&self) -> Option<HexNum> {
        match self {
            KeyEvent::Inception(e) | KeyEvent::DelegatedInception(e) => Some(e.s),
            KeyEvent::Rotation(e) | KeyEvent::DelegatedRotation(e) => Some(e.s),
            KeyEvent::Interaction(e) => Some(e.s),
            KeyEvent::Receipt(e) => Some(e.s),
            _ => None,
        }
    }

    /// Whether this event belongs on a key event log.
    pub fn is_kel_event(&self) -> bool {
        matches!(self.ilk(), Some(Ilk::Icp | Ilk::Dip | Ilk::Rot | Ilk::Drt | Ilk::Ixn))
    }
}

impl Serialize for KeyEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            KeyEvent::Inception(e) | KeyEvent::DelegatedInception(e) => e.serialize(serializer),
            KeyEvent::Rotation(e) | KeyEvent::DelegatedRotation(e) => e.serialize(serializer),
            KeyEvent::Interaction(e) => e.serialize(serializer),
            KeyEvent::Receipt(e) => e.serialize(serializer),
            KeyEvent::Reply(e) => e.serialize(serializer),
            KeyEvent::Query(e) => e.serialize(serializer),
            KeyEvent::Exchange(e) => e.serialize(serializer),
            KeyEvent::RegistryInception(e) => e.serialize(serializer),
            KeyEvent::Issuance(e) | KeyEvent::Revocation(e) => e.serialize(serializer),
            KeyEvent::Other(map) => map.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for KeyEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Object(map) => KeyEvent::from_map(map).map_err(serde::de::Error::custom),
            _ => Err(serde::de::Error::custom("key event must be an object")),
        }
    }
}
