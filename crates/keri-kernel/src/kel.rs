//! Key event log replay.
//!
//! A [`Kel`] folds the messages of one identifier into its current
//! [`KeyState`], checking each payload's SAID and controller signatures
//! before handing it to the reducer.

use std::collections::BTreeSet;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::io::AsyncRead;
use tracing::{debug, info};

use keri_kernel_core::{deindex, reduce_at, KeyEvent, KeyState, Message, Threshold};
use keri_kernel_stream::{parse_with_config, ChunkSource, MemorySource, ParserConfig, ReaderSource};

use crate::error::{KernelError, Result};

/// Configuration for log replay.
#[derive(Debug, Clone)]
pub struct KelConfig {
    /// Limits applied by the stream parser.
    pub parser: ParserConfig,
    /// Recompute each payload's SAID before applying it.
    pub verify_saids: bool,
    /// Require a threshold of valid controller signatures.
    pub verify_signatures: bool,
}

impl Default for KelConfig {
    fn default() -> Self {
        Self {
            parser: ParserConfig::default(),
            verify_saids: true,
            verify_signatures: true,
        }
    }
}

/// Outcome of applying one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyResult {
    /// The event extended the log.
    Accepted { sn: String, said: String },
    /// The message is not a key event of this log (receipt, reply, foreign
    /// protocol) and was ignored.
    Skipped,
}

/// The accepted events of one identifier and the state they produce.
#[derive(Debug, Clone, Default)]
pub struct Kel {
    config: KelConfig,
    state: KeyState,
    events: Vec<Message>,
}

impl Kel {
    /// Create an empty log with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty log with custom configuration.
    pub fn with_config(config: KelConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &KelConfig {
        &self.config
    }

    /// Current key state. The default state until an inception is applied.
    pub fn state(&self) -> &KeyState {
        &self.state
    }

    /// Accepted events, in log order.
    pub fn events(&self) -> &[Message] {
        &self.events
    }

    /// The identifier prefix, once incepted.
    pub fn prefix(&self) -> Option<&str> {
        self.state.is_incepted().then_some(self.state.i.as_str())
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Apply
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply one message, stamping the state with the current time.
    pub fn apply(&mut self, message: Message) -> Result<ApplyResult> {
        self.apply_at(message, Utc::now())
    }

    /// Apply one message, stamping the state with `now`.
    ///
    /// On error the log is left unchanged.
    pub fn apply_at(&mut self, message: Message, now: DateTime<Utc>) -> Result<ApplyResult> {
        if !message.version.is_keri() || !message.payload.is_kel_event() {
            debug!(
                protocol = %message.version.protocol,
                ilk = message.payload.ilk_str(),
                "skipping non-KEL message"
            );
            return Ok(ApplyResult::Skipped);
        }

        if self.config.verify_saids {
            message.verify_said()?;
        }

        let next = reduce_at(&self.state, &message, now)?;

        if self.config.verify_signatures {
            self.check_signatures(&message)?;
        }

        let result = ApplyResult::Accepted {
            sn: next.s.clone(),
            said: next.d.clone(),
        };
        debug!(i = %next.i, s = %next.s, d = %next.d, "applied key event");
        self.state = next;
        self.events.push(message);
        Ok(result)
    }

    /// Verify controller signatures against the keys that sign `message`.
    ///
    /// Establishment events are signed by the keys they introduce; an
    /// interaction is signed by the current keys.
    fn check_signatures(&self, message: &Message) -> Result<()> {
        let (keys, threshold) = match &message.payload {
            KeyEvent::Inception(e) | KeyEvent::DelegatedInception(e) => (&e.k, &e.kt),
            KeyEvent::Rotation(e) | KeyEvent::DelegatedRotation(e) => (&e.k, &e.kt),
            _ => (&self.state.k, &self.state.kt),
        };

        message.verify_signatures(keys)?;

        let mut indices = BTreeSet::new();
        for sig in message.controller_signatures() {
            indices.insert(deindex(sig)?.index);
        }

        let required = required_signatures(threshold);
        if (indices.len() as u64) < required {
            return Err(KernelError::InsufficientSignatures {
                said: message.payload.said().to_string(),
                got: indices.len(),
                required,
            });
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Replay
    // ─────────────────────────────────────────────────────────────────────────

    /// Parse a stream and apply every message in order.
    ///
    /// Returns the number of events accepted. Stops at the first error.
    pub async fn replay<S: ChunkSource>(&mut self, source: S) -> Result<usize> {
        let mut messages = parse_with_config(source, self.config.parser.clone());
        let mut accepted = 0;
        while let Some(message) = messages.next_message().await? {
            if let ApplyResult::Accepted { .. } = self.apply(message)? {
                accepted += 1;
            }
        }
        info!(accepted, prefix = ?self.prefix(), "replayed stream");
        Ok(accepted)
    }

    /// Replay from any async reader.
    pub async fn replay_reader<R>(&mut self, reader: R) -> Result<usize>
    where
        R: AsyncRead + Unpin + Send,
    {
        self.replay(ReaderSource::new(reader)).await
    }

    /// Replay a complete byte buffer.
    pub async fn replay_bytes(&mut self, data: impl Into<Bytes>) -> Result<usize> {
        self.replay(MemorySource::from_bytes(data)).await
    }

    /// Serialize the accepted events with their attachments.
    pub fn to_cesr(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for message in &self.events {
            out.extend_from_slice(&message.to_cesr()?);
        }
        Ok(out)
    }
}

/// Signatures needed to satisfy a threshold.
///
/// Weighted thresholds are not evaluated; any one signature satisfies them.
fn required_signatures(threshold: &Threshold) -> u64 {
    threshold.as_simple().unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keri_kernel_core::{interact, HexNum, Ilk, InceptionBuilder, Keypair, StateError};

    fn keypair(byte: u8) -> Keypair {
        Keypair::from_seed(&[byte; 32])
    }

    fn signed(event: KeyEvent, signer: &Keypair) -> Message {
        let mut message = Message::from_event(event).unwrap();
        message.sign(signer, 0).unwrap();
        message
    }

    fn incepted(signer: &Keypair) -> Kel {
        let icp = InceptionBuilder::new(vec![signer.public_key().to_qb64(true)])
            .build()
            .unwrap();
        let mut kel = Kel::new();
        kel.apply(signed(KeyEvent::Inception(icp), signer)).unwrap();
        kel
    }

    #[test]
    fn test_apply_inception_and_interaction() {
        let signer = keypair(1);
        let mut kel = incepted(&signer);
        assert_eq!(kel.len(), 1);
        assert_eq!(kel.state().et, "icp");

        let ixn = interact(kel.state(), vec![]).unwrap();
        let result = kel.apply(signed(KeyEvent::Interaction(ixn), &signer)).unwrap();
        assert!(matches!(result, ApplyResult::Accepted { ref sn, .. } if sn == "1"));
        assert_eq!(kel.state().et, "ixn");
        assert_eq!(kel.state().f, "1");
    }

    #[test]
    fn test_unsigned_event_rejected() {
        let signer = keypair(2);
        let icp = InceptionBuilder::new(vec![signer.public_key().to_qb64(true)])
            .build()
            .unwrap();
        let message = Message::from_event(KeyEvent::Inception(icp)).unwrap();

        let mut kel = Kel::new();
        let err = kel.apply(message).unwrap_err();
        assert!(matches!(
            err,
            KernelError::InsufficientSignatures { got: 0, required: 1, .. }
        ));
        assert!(kel.is_empty());
        assert!(!kel.state().is_incepted());
    }

    #[test]
    fn test_wrong_signer_rejected() {
        let signer = keypair(3);
        let mut kel = incepted(&signer);
        let ixn = interact(kel.state(), vec![]).unwrap();
        let err = kel
            .apply(signed(KeyEvent::Interaction(ixn), &keypair(4)))
            .unwrap_err();
        assert!(matches!(err, KernelError::Event(_)));
        assert_eq!(kel.len(), 1);
    }

    #[test]
    fn test_unverified_config_accepts_unsigned() {
        let signer = keypair(5);
        let icp = InceptionBuilder::new(vec![signer.public_key().to_qb64(true)])
            .build()
            .unwrap();
        let mut kel = Kel::with_config(KelConfig {
            verify_signatures: false,
            ..KelConfig::default()
        });
        kel.apply(Message::from_event(KeyEvent::Inception(icp)).unwrap())
            .unwrap();
        assert!(kel.state().is_incepted());
    }

    #[test]
    fn test_reducer_error_leaves_log_unchanged() {
        let signer = keypair(6);
        let mut kel = incepted(&signer);
        let before = kel.state().clone();

        let icp = InceptionBuilder::new(vec![signer.public_key().to_qb64(true)])
            .build()
            .unwrap();
        let err = kel
            .apply(signed(KeyEvent::Inception(icp), &signer))
            .unwrap_err();
        assert!(matches!(
            err,
            KernelError::State(StateError::DuplicateInception(_))
        ));
        assert_eq!(kel.state(), &before);
        assert_eq!(kel.len(), 1);
    }

    #[test]
    fn test_receipt_skipped() {
        let signer = keypair(7);
        let mut kel = incepted(&signer);
        let rct = keri_kernel_core::receipt(&kel.state().i, HexNum(0), &kel.state().d).unwrap();
        let result = kel.apply(Message::from_event(KeyEvent::Receipt(rct)).unwrap()).unwrap();
        assert_eq!(result, ApplyResult::Skipped);
        assert_eq!(kel.len(), 1);
        assert_eq!(kel.events()[0].payload.ilk(), Some(Ilk::Icp));
    }

    #[tokio::test]
    async fn test_replay_round_trip() {
        let signer = keypair(8);
        let mut kel = incepted(&signer);
        let ixn = interact(kel.state(), vec![]).unwrap();
        kel.apply(signed(KeyEvent::Interaction(ixn), &signer)).unwrap();

        let stream = kel.to_cesr().unwrap();
        let mut replayed = Kel::new();
        let accepted = replayed.replay(MemorySource::chunked(stream, 11)).await.unwrap();
        assert_eq!(accepted, 2);
        assert_eq!(replayed.state().d, kel.state().d);
        assert_eq!(replayed.prefix(), kel.prefix());
    }

    fn two_key_inception(first: &Keypair, second: &Keypair) -> Message {
        let icp = InceptionBuilder::new(vec![
            first.public_key().to_qb64(true),
            second.public_key().to_qb64(true),
        ])
        .build()
        .unwrap();
        assert_eq!(icp.kt.as_simple(), Some(2));
        Message::from_event(KeyEvent::Inception(icp)).unwrap()
    }

    #[test]
    fn test_multi_key_inception() {
        let (first, second) = (keypair(9), keypair(10));
        let mut message = two_key_inception(&first, &second);
        message.sign(&first, 0).unwrap();
        message.sign(&second, 1).unwrap();

        let mut kel = Kel::new();
        kel.apply(message).unwrap();
        assert_eq!(kel.state().k.len(), 2);
    }

    #[test]
    fn test_multi_key_threshold_not_met() {
        let (first, second) = (keypair(11), keypair(12));

        let mut one = two_key_inception(&first, &second);
        one.sign(&second, 1).unwrap();
        let mut kel = Kel::new();
        assert!(matches!(
            kel.apply(one).unwrap_err(),
            KernelError::InsufficientSignatures { got: 1, required: 2, .. }
        ));

        // the same signer twice counts once
        let mut repeated = two_key_inception(&first, &second);
        repeated.sign(&first, 0).unwrap();
        repeated.sign(&first, 0).unwrap();
        assert!(matches!(
            kel.apply(repeated).unwrap_err(),
            KernelError::InsufficientSignatures { got: 1, required: 2, .. }
        ));
        assert!(kel.is_empty());
    }

    #[test]
    fn test_signature_at_wrong_index_rejected() {
        let (first, second) = (keypair(13), keypair(14));
        let mut message = two_key_inception(&first, &second);
        message.sign(&first, 1).unwrap();
        message.sign(&second, 0).unwrap();

        let mut kel = Kel::new();
        assert!(matches!(kel.apply(message).unwrap_err(), KernelError::Event(_)));
    }

    #[test]
    fn test_required_signatures() {
        assert_eq!(required_signatures(&Threshold::simple(2)), 2);
        assert_eq!(required_signatures(&Threshold::simple(0)), 0);
    }
}
