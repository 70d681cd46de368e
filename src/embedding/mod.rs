//! C1 — EmbeddingProvider (spec §4.1).

pub mod embedder;
pub mod hashing;
pub mod provider;

#[cfg(feature = "oracle-http")]
pub mod remote;

pub use embedder::Embedder;
pub use hashing::HashingEmbedder;
pub use provider::EmbeddingProvider;
