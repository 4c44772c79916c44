//! Test fixtures and helpers.
//!
//! A [`TestController`] owns deterministic keys and builds a signed key event
//! log, tracking key state as it goes.

use chrono::{DateTime, Utc};
use serde_json::Value;

use keri_kernel_core::codes::counter;
use keri_kernel_core::crypto::next_key_digest;
use keri_kernel_core::{
    interact, receipt, reduce_at, AttachmentsBuilder, InceptionBuilder, KeyEvent, KeyState,
    Keypair, Message, RotationBuilder,
};

/// Hex seed of the key used by the published event vectors.
pub const VECTOR_SECRET: &str = "3c794df9d5e8546f1b800c8f7b27075313422859da43c923e4423e8b634c7c00";

/// The keypair behind the published event vectors.
pub fn vector_keypair() -> Keypair {
    let mut seed = [0u8; 32];
    let bytes = hex::decode(VECTOR_SECRET).expect("vector secret is hex");
    seed.copy_from_slice(&bytes);
    Keypair::from_seed(&seed)
}

/// A keypair from a repeated seed byte.
pub fn keypair(byte: u8) -> Keypair {
    Keypair::from_seed(&[byte; 32])
}

/// Fixed timestamp used when folding fixture events.
pub fn fixed_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_704_067_200, 0).unwrap_or_default()
}

/// A transferable controller with pre-rotated next keys.
///
/// Key `j` of generation `g` is derived from seed byte `seed + g * width + j`,
/// so two controllers built from the same seed produce identical logs. Every
/// event is signed by all current keys and uses the default threshold of all
/// keys.
pub struct TestController {
    seed: u8,
    width: u8,
    generation: u8,
    current: Vec<Keypair>,
    next: Vec<Keypair>,
    state: KeyState,
    messages: Vec<Message>,
}

impl TestController {
    /// A single-key controller.
    pub fn new(seed: u8) -> Self {
        Self::multi(seed, 1)
    }

    /// A controller with `width` signing keys per establishment event.
    pub fn multi(seed: u8, width: u8) -> Self {
        let width = width.max(1);
        Self {
            seed,
            width,
            generation: 0,
            current: generation_keys(seed, width, 0),
            next: generation_keys(seed, width, 1),
            state: KeyState::default(),
            messages: Vec::new(),
        }
    }

    /// The keypairs currently authorised to sign, in key-list order.
    pub fn current(&self) -> &[Keypair] {
        &self.current
    }

    pub fn state(&self) -> &KeyState {
        &self.state
    }

    pub fn prefix(&self) -> &str {
        &self.state.i
    }

    /// Every event built so far, signed, in log order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    fn current_keys(&self) -> Vec<String> {
        self.current
            .iter()
            .map(|kp| kp.public_key().to_qb64(true))
            .collect()
    }

    fn next_digests(&self) -> Vec<String> {
        self.next
            .iter()
            .map(|kp| next_key_digest(&kp.public_key().to_qb64(true)))
            .collect()
    }

    /// Build, sign, and record the inception event.
    pub fn incept(&mut self) -> Message {
        let icp = InceptionBuilder::new(self.current_keys())
            .next_digests(self.next_digests())
            .build()
            .expect("inception builds");
        self.record(KeyEvent::Inception(icp))
    }

    /// Build, sign, and record an interaction anchoring `data`.
    pub fn interact(&mut self, data: Vec<Value>) -> Message {
        let ixn = interact(&self.state, data).expect("interaction builds");
        self.record(KeyEvent::Interaction(ixn))
    }

    /// Rotate to the pre-committed next keys and commit to fresh ones.
    pub fn rotate(&mut self) -> Message {
        self.generation = self.generation.wrapping_add(1);
        let fresh = generation_keys(self.seed, self.width, self.generation.wrapping_add(1));
        self.current = std::mem::replace(&mut self.next, fresh);

        let rot = RotationBuilder::new(&self.state, self.current_keys())
            .next_digests(self.next_digests())
            .build()
            .expect("rotation builds");
        self.record(KeyEvent::Rotation(rot))
    }

    /// A witness receipt for the latest event, signed by `witness`.
    pub fn witness_receipt(&self, witness: &Keypair) -> Message {
        let latest = self.messages.last().expect("receipt needs a prior event");
        let sn = latest.payload.sn().unwrap_or_default();
        let rct = receipt(&self.state.i, sn, latest.payload.said()).expect("receipt builds");

        let mut message = Message::from_event(KeyEvent::Receipt(rct)).expect("receipt serializes");
        message.attach(
            counter::NON_TRANS_RECEIPT_COUPLES,
            witness.public_key().to_qb64(false),
        );
        message.attach(
            counter::NON_TRANS_RECEIPT_COUPLES,
            witness.sign(&latest.raw).to_qb64(),
        );
        message
    }

    /// The whole log as a CESR stream.
    pub fn stream(&self) -> Vec<u8> {
        self.messages
            .iter()
            .flat_map(|m| m.to_cesr().expect("message serializes"))
            .collect()
    }

    /// The whole log as a CESR stream with each message's attachments
    /// wrapped in an attachment group.
    pub fn grouped_stream(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for message in &self.messages {
            out.extend_from_slice(&message.raw);
            let attachments = AttachmentsBuilder::new()
                .controller_sigs(message.controller_signatures().iter().cloned())
                .grouped(true)
                .build()
                .expect("attachments encode");
            out.extend_from_slice(attachments.as_bytes());
        }
        out
    }

    fn record(&mut self, event: KeyEvent) -> Message {
        let mut message = Message::from_event(event).expect("event serializes");
        for (index, keypair) in self.current.iter().enumerate() {
            message
                .sign(keypair, index as u64)
                .expect("signature indexes");
        }
        self.state = reduce_at(&self.state, &message, fixed_time()).expect("event extends log");
        self.messages.push(message.clone());
        message
    }
}

fn generation_keys(seed: u8, width: u8, generation: u8) -> Vec<Keypair> {
    let base = seed.wrapping_add(generation.wrapping_mul(width));
    (0..width).map(|j| keypair(base.wrapping_add(j))).collect()
}

/// Controllers with distinct keys for multi-identifier tests.
pub fn multi_controller_fixtures(count: u8) -> Vec<TestController> {
    (0..count)
        .map(|i| TestController::new(i.wrapping_mul(16).wrapping_add(1)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use keri_kernel_core::Ilk;

    #[test]
    fn test_vector_keypair() {
        assert_eq!(
            vector_keypair().public_key().to_qb64(false),
            "BKN0Oz4YvfPgHUB79WKtIg8xeu4Y0P8lmJn_zCWksR9w"
        );
    }

    #[test]
    fn test_controller_log() {
        let mut controller = TestController::new(0x10);
        let icp = controller.incept();
        assert_eq!(controller.prefix(), icp.payload.said());

        controller.interact(vec![]);
        let rot = controller.rotate();
        assert_eq!(rot.payload.ilk(), Some(Ilk::Rot));
        assert_eq!(controller.state().s, "2");
        assert_eq!(controller.state().k, vec![controller.current()[0].public_key().to_qb64(true)]);
        assert_eq!(controller.messages().len(), 3);
    }

    #[test]
    fn test_controller_deterministic() {
        let build = || {
            let mut c = TestController::new(0x20);
            c.incept();
            c.rotate();
            c.stream()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_multi_key_controller() {
        let mut controller = TestController::multi(0x40, 3);
        let icp = controller.incept();
        assert_eq!(icp.controller_signatures().len(), 3);
        assert_eq!(controller.state().kt.as_simple(), Some(3));
        assert_eq!(controller.state().k.len(), 3);

        controller.rotate();
        let keys: Vec<String> = controller
            .current()
            .iter()
            .map(|kp| kp.public_key().to_qb64(true))
            .collect();
        assert_eq!(controller.state().k, keys);
        assert_eq!(controller.state().n.len(), 3);
    }

    #[test]
    fn test_single_key_matches_width_one() {
        let build = |mut c: TestController| {
            c.incept();
            c.rotate();
            c.stream()
        };
        assert_eq!(
            build(TestController::new(0x50)),
            build(TestController::multi(0x50, 1))
        );
    }

    #[test]
    fn test_witness_receipt() {
        let mut controller = TestController::new(0x30);
        controller.incept();
        let rct = controller.witness_receipt(&keypair(0x99));
        assert_eq!(rct.receipt_couples().len(), 1);
        assert_eq!(rct.payload.said(), controller.state().d);
    }

    #[test]
    fn test_multi_controller() {
        let mut controllers = multi_controller_fixtures(3);
        let prefixes: Vec<String> = controllers
            .iter_mut()
            .map(|c| c.incept().payload.said().to_string())
            .collect();
        assert_ne!(prefixes[0], prefixes[1]);
        assert_ne!(prefixes[1], prefixes[2]);
    }
}
