//! Messages: a payload plus the attachments that followed it on the wire.

use bytes::Bytes;
use std::collections::BTreeMap;

use crate::attachments::{decode_seqner, group_arity};
use crate::codec::encode_counter;
use crate::codes::counter;
use crate::crypto::{verify_indexed, Keypair};
use crate::error::EventError;
use crate::event::KeyEvent;
use crate::said;
use crate::version::Version;

/// One framed payload and its attachment groups.
///
/// Attachments are keyed by the counter code that introduced them; each group
/// keeps its primitives in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub payload: KeyEvent,
    pub version: Version,
    /// The payload exactly as framed, for signature and SAID checks.
    pub raw: Bytes,
    pub attachments: BTreeMap<String, Vec<String>>,
}

impl Message {
    pub fn new(payload: KeyEvent, version: Version, raw: Bytes) -> Self {
        Self {
            payload,
            version,
            raw,
            attachments: BTreeMap::new(),
        }
    }

    /// Decode framed payload bytes.
    pub fn from_raw(version: Version, raw: Bytes) -> Result<Self, EventError> {
        let payload = KeyEvent::from_slice(&raw, version.kind)?;
        Ok(Self::new(payload, version, raw))
    }

    /// Wrap a built event, serializing it in its announced kind.
    pub fn from_event(payload: KeyEvent) -> Result<Self, EventError> {
        let version = payload
            .version()
            .ok_or(EventError::MissingField("v"))?;
        let raw = Bytes::from(payload.to_bytes()?);
        Ok(Self::new(payload, version, raw))
    }

    /// Primitives collected under `code`.
    pub fn group(&self, code: &str) -> &[String] {
        self.attachments
            .get(code)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Append one primitive to a group.
    pub fn attach(&mut self, code: &str, primitive: String) {
        self.attachments
            .entry(code.to_string())
            .or_default()
            .push(primitive);
    }

    /// Indexed controller signatures.
    pub fn controller_signatures(&self) -> &[String] {
        self.group(counter::CONTROLLER_IDX_SIGS)
    }

    /// Indexed witness signatures.
    pub fn witness_signatures(&self) -> &[String] {
        self.group(counter::WITNESS_IDX_SIGS)
    }

    /// Non-transferable receipt couples as `(backer, signature)`.
    pub fn receipt_couples(&self) -> Vec<(&str, &str)> {
        self.group(counter::NON_TRANS_RECEIPT_COUPLES)
            .chunks_exact(2)
            .map(|c| (c[0].as_str(), c[1].as_str()))
            .collect()
    }

    /// First-seen ordinal from a replay couple, if present.
    pub fn first_seen(&self) -> Option<u64> {
        self.group(counter::FIRST_SEEN_REPLAY_COUPLES)
            .first()
            .and_then(|s| decode_seqner(s).ok())
    }

    /// Sign the raw payload and attach an indexed controller signature.
    pub fn sign(&mut self, keypair: &Keypair, index: u64) -> Result<(), EventError> {
        let sig = keypair.sign(&self.raw).to_indexed(index)?;
        self.attach(counter::CONTROLLER_IDX_SIGS, sig);
        Ok(())
    }

    /// Check the payload's SAID against its raw bytes.
    pub fn verify_said(&self) -> Result<String, EventError> {
        said::verify_said(&self.raw, self.version.kind)
    }

    /// Verify every controller signature against `keys`.
    pub fn verify_signatures(&self, keys: &[String]) -> Result<usize, EventError> {
        verify_indexed(keys, &self.raw, self.controller_signatures())
    }

    /// Serialize the payload followed by its attachment groups.
    pub fn to_cesr(&self) -> Result<Vec<u8>, EventError> {
        let mut out = self.raw.to_vec();
        for (code, items) in &self.attachments {
            let count = items.len() / group_arity(code);
            out.extend_from_slice(encode_counter(code, count as u64)?.as_bytes());
            for item in items {
                out.extend_from_slice(item.as_bytes());
            }
        }
        Ok(out)
    }
}
