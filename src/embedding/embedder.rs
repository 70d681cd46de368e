//! The pluggable embedding backend seam (spec §4.1: "The underlying encoder
//! is pluggable").
//!
//! Grounded on the teacher's `embedding::embedder::Embedder` trait /
//! `PrecomputedEmbedder` split between "the thing that turns text into
//! vectors" and "the thing that caches and batches around it"
//! ([`crate::embedding::EmbeddingProvider`]).

use async_trait::async_trait;

use crate::error::Result;

/// Converts text into fixed-dimension vectors. Implementations need not
/// normalize or cache — [`crate::embedding::EmbeddingProvider`] does both.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// The dimension `D` this embedder always produces.
    fn dimension(&self) -> usize;

    /// Encode a batch of texts. Batch encoding is mandatory per spec §4.1;
    /// single-item requests are wrapped as batch-of-one by the caller.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
