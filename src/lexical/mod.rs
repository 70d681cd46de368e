//! C2 — LexicalIndex (spec §4.2).

pub mod fuzzy;
pub mod index;

pub use index::{BulkResult, LexicalHit, LexicalIndex, LexicalWeights, SharedLexicalIndex};
