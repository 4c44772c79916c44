//! Error types for stream parsing.

use keri_kernel_core::CodecError;
use thiserror::Error;

/// Errors that can occur while parsing a stream.
///
/// Every variant is fatal: the parser does not attempt to resynchronize, and
/// an assembler that surfaces one yields nothing further.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The stream ended part-way through a frame.
    #[error("unexpected end of stream: {buffered} bytes buffered, {needed} needed")]
    UnexpectedEndOfStream { buffered: usize, needed: usize },

    /// No code matched within four characters.
    #[error("unknown code: {0:?}")]
    UnknownCode(String),

    /// A frame began with a byte that is neither a payload opener nor text.
    #[error("unexpected start byte: 0x{0:02x}")]
    UnexpectedStartByte(u8),

    /// The payload's version string could not be read.
    #[error("invalid version string: {0}")]
    InvalidVersion(String),

    /// A payload announced a size above the configured limit.
    #[error("payload of {size} bytes exceeds limit of {max}")]
    PayloadTooLarge { size: usize, max: usize },

    /// A variable-size primitive announced a size above the configured limit.
    #[error("primitive of {size} characters exceeds limit of {max}")]
    PrimitiveTooLarge { size: usize, max: usize },

    /// A framed payload did not decode as an event body.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// A primitive's text was malformed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Reading from the underlying source failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for stream operations.
pub type Result<T> = std::result::Result<T, ParseError>;
