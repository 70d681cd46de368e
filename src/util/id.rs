//! Stable id assignment for documents that arrive without one.
//!
//! Grounded on the teacher's shard-prefixed id scheme (`util::id`): here there
//! is no sharding concern, but the same idea — a deterministic hash of
//! content standing in for a sequence counter — is what spec §4.4 calls for:
//! "computes id (stable hash of text if absent)".

use ahash::AHasher;
use std::hash::{Hash, Hasher};

/// Derive a stable, deterministic id from a document's text.
///
/// Same input always yields the same id (spec §8 property 5: `add_document`
/// is idempotent by id), independent of insertion order or process restarts.
pub fn stable_id(text: &str) -> String {
    let mut hasher = AHasher::default();
    text.hash(&mut hasher);
    format!("doc_{:016x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_text_yields_same_id() {
        assert_eq!(stable_id("销售额"), stable_id("销售额"));
    }

    #[test]
    fn different_text_yields_different_id() {
        assert_ne!(stable_id("销售额"), stable_id("销量"));
    }
}
