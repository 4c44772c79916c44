//! Error types for the KERI Kernel Core.

use thiserror::Error;

/// Errors raised by the primitive codec.
///
/// All codec errors are fatal to the single encode/decode call that raised
/// them; nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("unknown code: {0:?}")]
    UnknownCode(String),

    #[error("invalid size for code {code}: {reason}")]
    InvalidSize { code: String, reason: String },

    #[error("code {0} has no indexed counterpart")]
    NotIndexable(String),

    #[error("index {index} does not fit code {code}")]
    IndexOutOfRange { code: String, index: u64 },

    #[error("non-zero pad bits in {0}")]
    NonZeroPad(String),

    #[error("invalid base64: {0}")]
    InvalidBase64(String),

    #[error("invalid datetime: {0}")]
    InvalidDate(String),

    #[error("invalid version string: {0}")]
    InvalidVersion(String),
}

impl CodecError {
    pub(crate) fn invalid_size(code: &str, reason: impl Into<String>) -> Self {
        CodecError::InvalidSize {
            code: code.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while building, serializing, or verifying key events.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("event body is not an object")]
    NotAnObject,

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("said mismatch: expected {expected}, computed {computed}")]
    SaidMismatch { expected: String, computed: String },

    #[error("no signing keys provided")]
    NoKeys,

    #[error("unsupported serialization kind: {0}")]
    UnsupportedKind(String),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

impl From<serde_json::Error> for EventError {
    fn from(e: serde_json::Error) -> Self {
        EventError::Serialization(e.to_string())
    }
}

/// Errors raised by the key-state reducer.
///
/// Any of these signals a corrupt or out-of-order log; the partially
/// computed state must not be trusted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("an interaction cannot open a log")]
    MissingPriorEstablishment,

    #[error("unsupported event type: {0}")]
    UnsupportedEventType(String),

    #[error("log already incepted as {0}")]
    DuplicateInception(String),

    #[error("invalid sequence number: expected {expected}, got {got}")]
    OutOfOrder { expected: u64, got: u64 },

    #[error("prior digest mismatch: expected {expected}, got {got}")]
    PriorDigestMismatch { expected: String, got: String },

    #[error("identifier mismatch: expected {expected}, got {got}")]
    IdentifierMismatch { expected: String, got: String },
}
