//! # KERI Kernel Stream
//!
//! Incremental parsing of CESR streams into messages.
//!
//! ## Overview
//!
//! A stream interleaves versioned payloads with self-framing primitives. No
//! frame carries an external length prefix, so frame boundaries are recovered
//! from the payload's version string or the primitive's leading code. Bytes
//! may arrive in chunks of any size.
//!
//! ## Layers
//!
//! - [`ChunkSource`] - where bytes come from (memory, reader, channel, stream)
//! - [`StreamParser`] - yields one [`Frame`] per call
//! - [`MessageAssembler`] - groups frames into [`Message`]s
//!
//! ## Usage
//!
//! ```rust,no_run
//! use keri_kernel_stream::{parse, MemorySource};
//!
//! async fn example(bytes: Vec<u8>) -> keri_kernel_stream::Result<()> {
//!     let mut messages = parse(MemorySource::chunked(bytes, 1024));
//!     while let Some(message) = messages.next_message().await? {
//!         println!("{} with {} signatures",
//!             message.payload.ilk_str(),
//!             message.controller_signatures().len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! [`Message`]: keri_kernel_core::Message

pub mod assembler;
pub mod error;
pub mod parser;
pub mod source;

pub use assembler::{parse, parse_with_config, MessageAssembler};
pub use error::{ParseError, Result};
pub use parser::{decode_frames, Frame, ParserConfig, StreamParser};
pub use source::{ChannelSource, ChunkSource, MemorySource, ReaderSource, StreamSource};

/// Parse a complete byte buffer into messages.
pub async fn parse_bytes(data: impl Into<bytes::Bytes>) -> Result<Vec<keri_kernel_core::Message>> {
    parse(MemorySource::from_bytes(data)).collect().await
}
