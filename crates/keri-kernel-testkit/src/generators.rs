//! Proptest generators for property-based testing.

use proptest::prelude::*;

use keri_kernel_core::{CodeEntry, Keypair, MATTER};
use keri_kernel_stream::MemorySource;

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a fixed-size matter code with raw bytes of its exact size.
pub fn fixed_matter() -> impl Strategy<Value = (&'static str, Vec<u8>)> {
    let entries: Vec<&'static CodeEntry> = MATTER.iter().filter(|e| e.sizage.is_fixed()).collect();
    prop::sample::select(entries).prop_flat_map(|entry| {
        let size = entry.sizage.raw_size().unwrap_or(0);
        prop::collection::vec(any::<u8>(), size).prop_map(move |raw| (entry.code, raw))
    })
}

/// Generate a variable-size matter code with raw bytes aligned to its lead size.
pub fn variable_matter(max_len: usize) -> impl Strategy<Value = (&'static str, Vec<u8>)> {
    let entries: Vec<&'static CodeEntry> =
        MATTER.iter().filter(|e| !e.sizage.is_fixed()).collect();
    (prop::sample::select(entries), 0..=max_len).prop_flat_map(|(entry, n)| {
        let ls = entry.sizage.ls;
        let len = n + (3 - (n + ls) % 3) % 3;
        prop::collection::vec(any::<u8>(), len).prop_map(move |raw| (entry.code, raw))
    })
}

/// Generate a signature index small enough for a short indexed code.
pub fn small_index() -> impl Strategy<Value = u64> {
    0u64..64
}

/// Generate a sequence number.
pub fn sn() -> impl Strategy<Value = u64> {
    0u64..=u64::MAX
}

/// Generate anchor data for an interaction event.
pub fn anchors() -> impl Strategy<Value = Vec<serde_json::Value>> {
    prop::collection::vec(
        "[a-z]{1,8}".prop_map(|s| serde_json::json!({ "i": s })),
        0..4,
    )
}

/// Generate sorted cut points splitting `len` bytes into chunks.
pub fn cut_points(len: usize) -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(0..=len, 0..16).prop_map(|mut cuts| {
        cuts.sort_unstable();
        cuts.dedup();
        cuts
    })
}

/// Split `data` at the given cut points.
pub fn split_at_cuts(data: &[u8], cuts: &[usize]) -> Vec<Vec<u8>> {
    let mut chunks = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for &cut in cuts {
        let cut = cut.min(data.len());
        if cut > start {
            chunks.push(data[start..cut].to_vec());
            start = cut;
        }
    }
    if start < data.len() {
        chunks.push(data[start..].to_vec());
    }
    chunks
}

/// A memory source yielding `data` split at the given cut points.
pub fn chunked_source(data: &[u8], cuts: &[usize]) -> MemorySource {
    MemorySource::new(split_at_cuts(data, cuts))
}
