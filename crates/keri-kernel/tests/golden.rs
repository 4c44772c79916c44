//! Golden test vectors for cross-implementation verification.
//!
//! Every CESR implementation must produce identical:
//! - qb64 text for each primitive
//! - SAIDs for each event body
//! - indexed signatures (deterministic Ed25519)
//! - key state after replaying a stream

use keri_kernel::core::codes::counter;
use keri_kernel::core::{decode, encode, KeyState};
use keri_kernel::stream::ParseError;
use keri_kernel::{parse_bytes, reduce, KernelError, Kel, KelConfig, ParserConfig};
use keri_kernel_testkit::fixtures::{vector_keypair, TestController};
use keri_kernel_testkit::vectors::{ICP_JSON, ICP_SIGNATURE, IXN_JSON};
use serde::{Deserialize, Serialize};

/// A single golden log vector.
#[derive(Debug, Serialize, Deserialize)]
pub struct GoldenVector {
    pub name: String,
    pub description: String,

    // Inputs
    pub seed: u8,
    pub interactions: usize,
    pub rotations: usize,

    // Derived outputs
    pub prefix: String,
    pub inception_said: String,
    pub inception_signature: String,
    pub stream: String,
    pub final_sn: String,
    pub final_said: String,
    pub final_keys: Vec<String>,
}

/// Generate a golden vector from inputs.
fn generate_vector(
    name: &str,
    description: &str,
    seed: u8,
    interactions: usize,
    rotations: usize,
) -> GoldenVector {
    let mut controller = TestController::new(seed);
    let icp = controller.incept();
    for _ in 0..rotations {
        for _ in 0..interactions {
            controller.interact(vec![]);
        }
        controller.rotate();
    }
    if rotations == 0 {
        for _ in 0..interactions {
            controller.interact(vec![]);
        }
    }

    let state = controller.state();
    GoldenVector {
        name: name.to_string(),
        description: description.to_string(),
        seed,
        interactions,
        rotations,
        prefix: state.i.clone(),
        inception_said: icp.payload.said().to_string(),
        inception_signature: icp.controller_signatures()[0].clone(),
        stream: String::from_utf8(controller.stream()).unwrap(),
        final_sn: state.s.clone(),
        final_said: state.d.clone(),
        final_keys: state.k.clone(),
    }
}

/// Generate all golden vectors.
pub fn generate_all_vectors() -> Vec<GoldenVector> {
    vec![
        generate_vector("inception_only", "A single signed inception", 0x01, 0, 0),
        generate_vector("three_interactions", "Inception then three interactions", 0x02, 3, 0),
        generate_vector("one_rotation", "Inception then one rotation", 0x03, 0, 1),
        generate_vector(
            "interleaved",
            "Two rounds of two interactions followed by a rotation",
            0x04,
            2,
            2,
        ),
    ]
}

// =============================================================================
// SCENARIOS
// =============================================================================

#[test]
fn scenario_a_salt_round_trip() {
    let raw = [
        62, 241, 251, 162, 153, 225, 112, 174, 190, 97, 68, 130, 135, 122, 171, 199,
    ];
    let text = encode("0A", &raw).unwrap();
    assert_eq!(text, "0AA-8fuimeFwrr5hRIKHeqvH");

    let primitive = decode(&text).unwrap();
    assert_eq!(primitive.code, "0A");
    assert_eq!(primitive.raw, raw);
}

#[tokio::test]
async fn scenario_b_inception_state() {
    let messages = parse_bytes(ICP_JSON).await.unwrap();
    let state = reduce(&KeyState::default(), &messages[0]).unwrap();

    let key = "BKN0Oz4YvfPgHUB79WKtIg8xeu4Y0P8lmJn_zCWksR9w";
    assert_eq!(state.i, key);
    assert_eq!(state.s, "0");
    assert_eq!(state.d, "EFAWQA1ktXrt5BFptVJrx6zKT8n6UIqU1XDP0tSB6yUS");
    assert_eq!(state.k, vec![key.to_string()]);
    assert!(state.b.is_empty());
    assert_eq!(state.ee.s, "0");
    assert!(state.ee.ba.is_empty());
}

#[tokio::test]
async fn scenario_c_inception_then_interaction() {
    let messages = parse_bytes(format!("{ICP_JSON}{IXN_JSON}")).await.unwrap();
    let icp = reduce(&KeyState::default(), &messages[0]).unwrap();
    let ixn = reduce(&icp, &messages[1]).unwrap();

    assert_eq!(ixn.s, "1");
    assert_eq!(ixn.p, icp.d);
    assert_eq!(ixn.d, "EMm03oUVeQLMFxyQHx90rYeCI0t2X2vNujpt7Os2jzWI");
    assert_eq!(ixn.k, icp.k);
    assert_eq!(ixn.b, icp.b);
}

#[tokio::test]
async fn scenario_d_signed_stream() {
    let messages = parse_bytes(format!("{ICP_JSON}-AAB{ICP_SIGNATURE}"))
        .await
        .unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].group(counter::CONTROLLER_IDX_SIGS).len(), 1);
}

#[tokio::test]
async fn test_vector_log_replays() -> anyhow::Result<()> {
    let keypair = vector_keypair();
    let ixn_sig = keypair.sign(IXN_JSON.as_bytes()).to_indexed(0)?;
    let stream = format!("{ICP_JSON}-AAB{ICP_SIGNATURE}{IXN_JSON}-AAB{ixn_sig}");

    let mut kel = Kel::new();
    assert_eq!(kel.replay_bytes(stream).await?, 2);
    assert_eq!(kel.state().s, "1");
    assert_eq!(kel.prefix(), Some("BKN0Oz4YvfPgHUB79WKtIg8xeu4Y0P8lmJn_zCWksR9w"));
    Ok(())
}

// =============================================================================
// GENERATED VECTORS
// =============================================================================

#[test]
fn test_generate_vectors() {
    let vectors = generate_all_vectors();
    assert_eq!(vectors.len(), 4);

    for v in &vectors {
        println!("=== {} ===", v.name);
        println!("  description: {}", v.description);
        println!("  prefix: {}", v.prefix);
        println!("  final: s={} d={}", v.final_sn, v.final_said);
        println!();
    }
}

#[test]
fn test_vectors_deterministic() {
    let v1 = generate_all_vectors();
    let v2 = generate_all_vectors();

    for (a, b) in v1.iter().zip(v2.iter()) {
        assert_eq!(a.prefix, b.prefix, "prefix mismatch for {}", a.name);
        assert_eq!(
            a.inception_signature, b.inception_signature,
            "signature mismatch for {}",
            a.name
        );
        assert_eq!(a.stream, b.stream, "stream mismatch for {}", a.name);
        assert_eq!(a.final_said, b.final_said, "final said mismatch for {}", a.name);
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[tokio::test]
async fn test_vectors_replay() {
    init_tracing();
    for v in generate_all_vectors() {
        let mut kel = Kel::new();
        let accepted = kel.replay_bytes(v.stream.clone().into_bytes()).await.unwrap();

        let expected = 1 + v.interactions * v.rotations.max(1) + v.rotations;
        assert_eq!(accepted, expected, "event count mismatch for {}", v.name);
        assert_eq!(kel.prefix(), Some(v.prefix.as_str()), "prefix mismatch for {}", v.name);
        assert_eq!(kel.state().s, v.final_sn, "sn mismatch for {}", v.name);
        assert_eq!(kel.state().d, v.final_said, "said mismatch for {}", v.name);
        assert_eq!(kel.state().k, v.final_keys, "keys mismatch for {}", v.name);
    }
}

#[tokio::test]
async fn test_grouped_stream_replays() {
    let mut controller = TestController::new(0x05);
    controller.incept();
    controller.interact(vec![serde_json::json!({ "i": "anchor" })]);
    controller.rotate();

    let mut kel = Kel::new();
    let accepted = kel.replay_bytes(controller.grouped_stream()).await.unwrap();
    assert_eq!(accepted, 3);
    assert_eq!(kel.state().d, controller.state().d);
}

#[tokio::test]
async fn test_multi_key_log_replays() {
    let mut controller = TestController::multi(0x08, 2);
    controller.incept();
    controller.interact(vec![]);
    controller.rotate();
    controller.interact(vec![]);
    assert_eq!(controller.state().kt.as_simple(), Some(2));

    let mut kel = Kel::new();
    assert_eq!(kel.replay_bytes(controller.stream()).await.unwrap(), 4);
    assert_eq!(kel.state().k, controller.state().k);
    assert_eq!(kel.state().d, controller.state().d);

    let mut grouped = Kel::new();
    assert_eq!(grouped.replay_bytes(controller.grouped_stream()).await.unwrap(), 4);
    assert_eq!(grouped.state().d, controller.state().d);
}

#[tokio::test]
async fn test_reject_multi_key_event_missing_signature() {
    let mut controller = TestController::multi(0x09, 2);
    let icp = controller.incept();

    let mut stream = icp.raw.to_vec();
    stream.extend_from_slice(format!("-AAB{}", icp.controller_signatures()[1]).as_bytes());

    let mut kel = Kel::new();
    let err = kel.replay_bytes(stream).await.unwrap_err();
    assert!(matches!(
        err,
        KernelError::InsufficientSignatures { got: 1, required: 2, .. }
    ));
    assert!(kel.is_empty());
}

#[tokio::test]
async fn test_receipts_are_skipped() {
    let mut controller = TestController::new(0x06);
    controller.incept();
    let rct = controller.witness_receipt(&keri_kernel_testkit::fixtures::keypair(0x60));

    let mut stream = controller.stream();
    stream.extend_from_slice(&rct.to_cesr().unwrap());

    let mut kel = Kel::new();
    assert_eq!(kel.replay_bytes(stream).await.unwrap(), 1);
    assert_eq!(kel.len(), 1);
}

#[test]
fn print_golden_vectors_json() {
    #[derive(Serialize)]
    struct VectorFile {
        version: String,
        description: String,
        vectors: Vec<GoldenVector>,
    }

    let file = VectorFile {
        version: "0.1.0".to_string(),
        description: "Golden key event log vectors. Every implementation must produce identical outputs.".to_string(),
        vectors: generate_all_vectors(),
    };

    let json = serde_json::to_string_pretty(&file).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["vectors"].as_array().map(Vec::len), Some(4));
    println!("{}", json);
}

// =============================================================================
// REJECTION TEST VECTORS
// These test that invalid inputs are properly rejected.
// =============================================================================

#[tokio::test]
async fn test_reject_tampered_signature() {
    let mut sig = ICP_SIGNATURE.to_string();
    sig.replace_range(10..11, "e");
    let stream = format!("{ICP_JSON}-AAB{sig}");

    let mut kel = Kel::new();
    let err = kel.replay_bytes(stream).await.unwrap_err();
    assert!(matches!(err, KernelError::Event(_)), "got {err:?}");
    assert!(kel.is_empty());
}

#[tokio::test]
async fn test_reject_unsigned_inception() {
    let mut kel = Kel::new();
    let err = kel.replay_bytes(ICP_JSON).await.unwrap_err();
    assert!(matches!(
        err,
        KernelError::InsufficientSignatures { got: 0, required: 1, .. }
    ));
}

#[tokio::test]
async fn test_reject_said_mismatch() {
    let body = ICP_JSON.replace(r#""kt":"1""#, r#""kt":"2""#);
    let mut kel = Kel::with_config(KelConfig {
        verify_signatures: false,
        ..KelConfig::default()
    });
    let err = kel.replay_bytes(body).await.unwrap_err();
    assert!(matches!(err, KernelError::Event(_)), "got {err:?}");
}

#[tokio::test]
async fn test_reject_out_of_order() {
    let mut controller = TestController::new(0x07);
    controller.incept();
    controller.interact(vec![]);
    controller.interact(vec![]);

    let messages = controller.messages();
    let mut stream = messages[0].to_cesr().unwrap();
    stream.extend_from_slice(&messages[2].to_cesr().unwrap());

    let mut kel = Kel::new();
    let err = kel.replay_bytes(stream).await.unwrap_err();
    assert!(matches!(
        err,
        KernelError::State(keri_kernel::core::StateError::OutOfOrder { expected: 1, got: 2 })
    ));
    assert_eq!(kel.len(), 1);
}

#[tokio::test]
async fn test_reject_truncated_stream() {
    let stream = format!("{ICP_JSON}-AAB{ICP_SIGNATURE}");
    let truncated = stream[..stream.len() - 5].to_string();

    let mut kel = Kel::new();
    let err = kel.replay_bytes(truncated).await.unwrap_err();
    assert!(matches!(
        err,
        KernelError::Parse(ParseError::UnexpectedEndOfStream { .. })
    ));
}

#[tokio::test]
async fn test_reject_oversized_payload() {
    let mut kel = Kel::with_config(KelConfig {
        parser: ParserConfig {
            max_payload_size: 100,
            ..ParserConfig::default()
        },
        ..KelConfig::default()
    });
    let err = kel.replay_bytes(ICP_JSON).await.unwrap_err();
    assert!(matches!(
        err,
        KernelError::Parse(ParseError::PayloadTooLarge { size: 0xfd, max: 100 })
    ));
}
