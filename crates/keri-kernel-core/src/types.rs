//! Strong type definitions for key event fields.
//!
//! Sequence numbers and counts travel as lowercase hex strings; thresholds
//! travel as either a hex string or nested lists of fractional weights.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A non-negative integer carried as a lowercase hex string.
///
/// Used for sequence numbers (`s`), backer thresholds (`bt`) and first-seen
/// ordinals (`f`).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HexNum(pub u64);

impl HexNum {
    pub const ZERO: Self = Self(0);

    /// Get the numeric value.
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        format!("{:x}", self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.is_empty() || s.len() > 16 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u64::from_str_radix(s, 16).ok().map(Self)
    }

    /// The following number, saturating at `u64::MAX`.
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Debug for HexNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HexNum({:x})", self.0)
    }
}

impl fmt::Display for HexNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

impl From<u64> for HexNum {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Serialize for HexNum {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for HexNum {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct HexVisitor;

        impl<'de> Visitor<'de> for HexVisitor {
            type Value = HexNum;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a lowercase hex string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<HexNum, E> {
                HexNum::from_hex(v).ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_str(HexVisitor)
    }
}

/// A signing threshold.
///
/// Thresholds are stored and carried opaquely; evaluating them against a
/// signature set is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Threshold {
    /// M-of-N over the positional key list, as a hex string.
    Simple(String),
    /// One fractional weight per key, e.g. `["1/2", "1/2"]`.
    Weighted(Vec<String>),
    /// Several weighted clauses that must all be satisfied.
    MultiClause(Vec<Vec<String>>),
}

impl Threshold {
    /// A simple threshold of `n` signatures.
    pub fn simple(n: u64) -> Self {
        Threshold::Simple(HexNum(n).to_hex())
    }

    /// The numeric value of a simple threshold.
    pub fn as_simple(&self) -> Option<u64> {
        match self {
            Threshold::Simple(s) => HexNum::from_hex(s).map(|n| n.value()),
            _ => None,
        }
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold::Simple("0".to_string())
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Threshold::Simple(s) => f.write_str(s),
            Threshold::Weighted(w) => write!(f, "[{}]", w.join(",")),
            Threshold::MultiClause(c) => {
                let clauses: Vec<_> = c.iter().map(|w| format!("[{}]", w.join(","))).collect();
                write!(f, "[{}]", clauses.join(","))
            }
        }
    }
}
