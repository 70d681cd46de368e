//! C3 — VectorIndex (spec §4.3).

pub mod index;

pub use index::{cosine_similarity, SharedVectorIndex, VectorHit, VectorIndex};
