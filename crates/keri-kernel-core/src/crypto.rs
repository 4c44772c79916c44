//! Cryptographic primitives for the KERI Kernel.
//!
//! Wraps Ed25519 signing and Blake3 hashing with strong types that know
//! their CESR text form.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::codec::{decode, deindex, encode, index};
use crate::codes::matter;
use crate::error::EventError;

/// A 32-byte Blake3 hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Blake3Hash(pub [u8; 32]);

impl Blake3Hash {
    /// Compute the Blake3 hash of the given data.
    pub fn hash(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// CESR text form (`E` code).
    pub fn to_qb64(&self) -> String {
        // 32 bytes always fit the one-character digest code
        encode(matter::BLAKE3_256, &self.0).unwrap_or_default()
    }

    /// Parse from CESR text.
    pub fn from_qb64(text: &str) -> Result<Self, EventError> {
        let prim = decode(text)?;
        if prim.code != matter::BLAKE3_256 {
            return Err(EventError::Codec(crate::CodecError::UnknownCode(
                prim.code.to_string(),
            )));
        }
        let arr: [u8; 32] = prim
            .raw
            .as_slice()
            .try_into()
            .map_err(|_| EventError::Serialization("digest length".into()))?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for Blake3Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Digest").field(&self.to_qb64()).finish()
    }
}

impl fmt::Display for Blake3Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_qb64())
    }
}

/// A 32-byte Ed25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ed25519PublicKey(pub [u8; 32]);

impl Ed25519PublicKey {
    /// CESR text form: `D` when transferable, `B` when not.
    pub fn to_qb64(&self, transferable: bool) -> String {
        let code = if transferable {
            matter::ED25519
        } else {
            matter::ED25519N
        };
        encode(code, &self.0).unwrap_or_default()
    }

    /// Parse from CESR text with either key code.
    pub fn from_qb64(text: &str) -> Result<Self, EventError> {
        let prim = decode(text)?;
        if prim.code != matter::ED25519 && prim.code != matter::ED25519N {
            return Err(EventError::InvalidPublicKey(text.to_string()));
        }
        let arr: [u8; 32] = prim
            .raw
            .as_slice()
            .try_into()
            .map_err(|_| EventError::InvalidPublicKey(text.to_string()))?;
        Ok(Self(arr))
    }

    /// Verify a signature over a message.
    pub fn verify(&self, message: &[u8], signature: &Ed25519Signature) -> Result<(), EventError> {
        let verfer = VerifyingKey::from_bytes(&self.0)
            .map_err(|_| EventError::InvalidPublicKey(self.to_qb64(true)))?;

        verfer
            .verify(message, &Signature::from_bytes(&signature.0))
            .map_err(|_| EventError::InvalidSignature)
    }
}

impl fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Verfer").field(&self.to_qb64(true)).finish()
    }
}

/// A 64-byte Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Ed25519Signature(pub [u8; 64]);

impl Ed25519Signature {
    /// CESR text form (`0B` code).
    pub fn to_qb64(&self) -> String {
        encode(matter::ED25519_SIG, &self.0).unwrap_or_default()
    }

    /// Indexed CESR text form for signer `idx`.
    pub fn to_indexed(&self, idx: u64) -> Result<String, EventError> {
        Ok(index(&self.to_qb64(), idx)?)
    }

    /// Parse from plain CESR text.
    pub fn from_qb64(text: &str) -> Result<Self, EventError> {
        let prim = decode(text)?;
        if prim.code != matter::ED25519_SIG {
            return Err(EventError::InvalidSignature);
        }
        let arr: [u8; 64] = prim
            .raw
            .as_slice()
            .try_into()
            .map_err(|_| EventError::InvalidSignature)?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.to_qb64();
        write!(f, "Cigar({}..)", &text[..text.len().min(12)])
    }
}

/// An Ed25519 signer.
#[derive(Clone)]
pub struct Keypair {
    signer: SigningKey,
}

impl Keypair {
    /// A signer with a fresh random seed.
    pub fn generate() -> Self {
        Self {
            signer: SigningKey::generate(&mut rand::thread_rng()),
        }
    }

    /// A signer derived from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signer: SigningKey::from_bytes(seed),
        }
    }

    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.signer.verifying_key().to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> Ed25519Signature {
        Ed25519Signature(self.signer.sign(message).to_bytes())
    }

    /// The secret seed as a CESR `A` primitive.
    pub fn seed_qb64(&self) -> String {
        encode(matter::ED25519_SEED, &self.signer.to_bytes()).unwrap_or_default()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// Digest of a key for use as a next-key commitment.
pub fn next_key_digest(key_qb64: &str) -> String {
    Blake3Hash::hash(key_qb64.as_bytes()).to_qb64()
}

/// Verify indexed signatures against a key list.
///
/// Each signature names its key by index. Returns the number of signatures
/// verified; fails on the first invalid one.
pub fn verify_indexed(
    keys: &[String],
    message: &[u8],
    signatures: &[String],
) -> Result<usize, EventError> {
    for sig in signatures {
        let d = deindex(sig)?;
        let key = usize::try_from(d.index)
            .ok()
            .and_then(|i| keys.get(i))
            .ok_or(EventError::InvalidSignature)?;
        let key = Ed25519PublicKey::from_qb64(key)?;
        key.verify(message, &Ed25519Signature::from_qb64(&d.value)?)?;
    }
    Ok(signatures.len())
}
