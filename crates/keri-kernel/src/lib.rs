//! # KERI Kernel
//!
//! The unified API for the KERI Kernel: CESR streams in, key state out.
//!
//! ## Overview
//!
//! The kernel is a portable library for:
//!
//! - **Codec**: Self-framing CESR primitives, indexed signatures, and counters
//! - **Streams**: Incremental parsing of payloads and attachments from chunks
//! - **Key state**: Folding an identifier's key event log into its current keys
//!
//! ## Key Concepts
//!
//! - **Primitive**: A code followed by its value; the code fixes the length.
//! - **Message**: One payload plus the attachment groups that follow it.
//! - **KEL**: The ordered, hash-chained events of one identifier.
//! - **Key state**: The result of replaying a KEL from inception.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use keri_kernel::{Kel, KelConfig};
//!
//! async fn example(stream: Vec<u8>) -> keri_kernel::Result<()> {
//!     let mut kel = Kel::with_config(KelConfig::default());
//!     kel.replay_bytes(stream).await?;
//!
//!     let state = kel.state();
//!     println!("{} at sn {} with keys {:?}", state.i, state.s, state.k);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `keri_kernel::core` - Codec, events, messages, and the reducer
//! - `keri_kernel::stream` - Chunk sources, the frame parser, and assembly

pub mod error;
pub mod kel;

pub use error::{KernelError, Result};
pub use kel::{ApplyResult, Kel, KelConfig};

// Re-export component crates
pub use keri_kernel_core as core;
pub use keri_kernel_stream as stream;

// Re-export commonly used types
pub use keri_kernel_core::{
    decode, deindex, encode, index, reduce, resolve_key_state, InceptionBuilder, KeyEvent,
    KeyState, Keypair, Message, RotationBuilder,
};
pub use keri_kernel_stream::{parse, parse_bytes, ChunkSource, MemorySource, ParserConfig};
