//! # KERI Kernel Testkit
//!
//! Testing utilities for the KERI Kernel.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known primitives and events with their exact encodings
//! - **Generators**: Proptest strategies for codes, raw values, and chunk splits
//! - **Fixtures**: A deterministic controller that builds signed key event logs
//!
//! ## Golden Vectors
//!
//! ```rust
//! use keri_kernel_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, qb64) in verify_all_vectors() {
//!     assert!(matches, "{name}: {qb64}");
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use keri_kernel_testkit::generators::fixed_matter;
//!
//! proptest! {
//!     #[test]
//!     fn round_trip((code, raw) in fixed_matter()) {
//!         let text = keri_kernel_core::encode(code, &raw).unwrap();
//!         prop_assert_eq!(keri_kernel_core::decode(&text).unwrap().raw, raw);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use keri_kernel_testkit::fixtures::TestController;
//!
//! let mut controller = TestController::new(7);
//! controller.incept();
//! controller.interact(vec![]);
//! let stream = controller.stream();
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{multi_controller_fixtures, vector_keypair, TestController};
pub use generators::{chunked_source, split_at_cuts};
pub use vectors::{all_vectors, event_vectors, verify_all_vectors, EventVector, GoldenVector};
