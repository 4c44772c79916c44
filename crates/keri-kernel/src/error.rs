//! Error types for the unified kernel API.

use thiserror::Error;

use keri_kernel_core::{CodecError, EventError, StateError};
use keri_kernel_stream::ParseError;

/// Unified error type for kernel operations.
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("event error: {0}")]
    Event(#[from] EventError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("state error: {0}")]
    State(#[from] StateError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("event {said} carries {got} verified signatures, threshold is {required}")]
    InsufficientSignatures {
        said: String,
        got: usize,
        required: u64,
    },
}

/// Result type for kernel operations.
pub type Result<T> = std::result::Result<T, KernelError>;
