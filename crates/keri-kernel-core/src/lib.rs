//! # KERI Kernel Core
//!
//! Pure primitives for the KERI Kernel: the CESR codec, key events, and the
//! key-state reducer.
//!
//! This crate contains no I/O, no storage, no networking. It is pure computation
//! over cryptographic data structures.
//!
//! ## Key Types
//!
//! - [`CodeTable`] - Static code-to-size tables for the three code families
//! - [`KeyEvent`] - One variant per event ilk, keyed by the `t` field
//! - [`Message`] - A framed payload plus its attachment groups
//! - [`KeyState`] - Current keys and witnesses of one identifier
//!
//! ## Codec
//!
//! Every primitive is self-framing: its leading code determines its exact
//! length. See [`codec`] for encode/decode/index and [`codes`] for the tables.

pub mod attachments;
pub mod b64;
pub mod builder;
pub mod codec;
pub mod codes;
pub mod crypto;
pub mod date;
pub mod error;
pub mod event;
pub mod message;
pub mod said;
pub mod state;
pub mod types;
pub mod version;

pub use attachments::{AttachmentsBuilder, EventSeal};
pub use builder::{interact, query, receipt, reply, InceptionBuilder, RotationBuilder};
pub use codec::{
    decode, decode_counter, deindex, encode, encode_counter, index, CounterFrame, Deindexed,
    Primitive,
};
pub use codes::{CodeEntry, CodeTable, Family, Sizage, COUNTER, INDEXER, MATTER};
pub use crypto::{Blake3Hash, Ed25519PublicKey, Ed25519Signature, Keypair};
pub use date::{decode_date, encode_date};
pub use error::{CodecError, EventError, StateError};
pub use event::{Ilk, KeyEvent};
pub use message::Message;
pub use said::{saidify, verify_said, versify};
pub use state::{reduce, reduce_at, resolve_key_state, EstablishmentRecord, KeyState};
pub use types::{HexNum, Threshold};
pub use version::{Kind, Version};
