//! Golden test vectors for deterministic verification.
//!
//! Known primitives and events with their exact qb64 text, shared with other
//! CESR implementations.

use keri_kernel_core::{decode, encode, Kind, KeyEvent};

/// A primitive with its expected text encoding.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub code: &'static str,
    /// Raw bytes, hex.
    pub raw: &'static str,
    /// Expected qb64 text.
    pub qb64: &'static str,
}

/// An event body with its expected SAID and signature.
#[derive(Debug, Clone)]
pub struct EventVector {
    pub name: &'static str,
    pub body: &'static str,
    pub said: &'static str,
    /// Indexed controller signature by the vector keypair, if published.
    pub signature: Option<&'static str>,
}

pub const ICP_JSON: &str = r#"{"v":"KERI10JSON0000fd_","t":"icp","d":"EFAWQA1ktXrt5BFptVJrx6zKT8n6UIqU1XDP0tSB6yUS","i":"BKN0Oz4YvfPgHUB79WKtIg8xeu4Y0P8lmJn_zCWksR9w","s":"0","kt":"1","k":["BKN0Oz4YvfPgHUB79WKtIg8xeu4Y0P8lmJn_zCWksR9w"],"nt":"0","n":[],"bt":"0","b":[],"c":[],"a":[]}"#;

pub const ICP_SIGNATURE: &str =
    "AADjncC4UZdYY413O2HwAeW8Q0hCe0tgkpNUqBbjgJnvKZ5mG3h2hnYTzwnO896ArtnKNSkIOikWjXy3NUPGFoEB";

pub const IXN_JSON: &str = r#"{"v":"KERI10JSON0000cb_","t":"ixn","d":"EMm03oUVeQLMFxyQHx90rYeCI0t2X2vNujpt7Os2jzWI","i":"BKN0Oz4YvfPgHUB79WKtIg8xeu4Y0P8lmJn_zCWksR9w","s":"1","p":"EFAWQA1ktXrt5BFptVJrx6zKT8n6UIqU1XDP0tSB6yUS","a":[]}"#;

/// Get all primitive vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "salt",
            code: "0A",
            raw: "3ef1fba299e170aebe614482877aabc7",
            qb64: "0AA-8fuimeFwrr5hRIKHeqvH",
        },
        GoldenVector {
            name: "non-transferable ed25519 key",
            code: "B",
            raw: "a3743b3e18bdf3e01d407bf562ad220f317aee18d0ff259899ffcc25a4b11f70",
            qb64: "BKN0Oz4YvfPgHUB79WKtIg8xeu4Y0P8lmJn_zCWksR9w",
        },
        GoldenVector {
            name: "long",
            code: "0H",
            raw: "f7f33f7f",
            qb64: "0HD38z9_",
        },
    ]
}

/// Get all event vectors.
pub fn event_vectors() -> Vec<EventVector> {
    vec![
        EventVector {
            name: "non-transferable inception",
            body: ICP_JSON,
            said: "EFAWQA1ktXrt5BFptVJrx6zKT8n6UIqU1XDP0tSB6yUS",
            signature: Some(ICP_SIGNATURE),
        },
        EventVector {
            name: "interaction",
            body: IXN_JSON,
            said: "EMm03oUVeQLMFxyQHx90rYeCI0t2X2vNujpt7Os2jzWI",
            signature: None,
        },
    ]
}

/// Verify every primitive vector encodes and decodes to itself.
///
/// Returns `(name, matches, produced)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let raw = hex::decode(v.raw).unwrap_or_default();
            let produced = encode(v.code, &raw).unwrap_or_default();
            let decoded = decode(v.qb64).map(|p| p.code == v.code && p.raw == raw);
            let matches = produced == v.qb64 && decoded.unwrap_or(false);
            (v.name.to_string(), matches, produced)
        })
        .collect()
}

/// Parse an event vector's body.
pub fn event_from_vector(vector: &EventVector) -> KeyEvent {
    KeyEvent::from_slice(vector.body.as_bytes(), Kind::Json).expect("vector body parses")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::vector_keypair;
    use keri_kernel_core::said::verify_said;

    #[test]
    fn test_primitive_vectors() {
        for (name, matches, produced) in verify_all_vectors() {
            assert!(matches, "vector '{name}' produced {produced}");
        }
    }

    #[test]
    fn test_event_vectors() {
        for vector in event_vectors() {
            let event = event_from_vector(&vector);
            assert_eq!(event.said(), vector.said, "vector '{}'", vector.name);
            assert_eq!(
                verify_said(vector.body.as_bytes(), Kind::Json).unwrap(),
                vector.said
            );
        }
    }

    #[test]
    fn test_signature_vector() {
        let keypair = vector_keypair();
        for vector in event_vectors() {
            if let Some(expected) = vector.signature {
                let sig = keypair.sign(vector.body.as_bytes()).to_indexed(0).unwrap();
                assert_eq!(sig, expected, "vector '{}'", vector.name);
            }
        }
    }
}
