//! C4 — DocumentStore (spec §4.4).

pub mod document;

pub use document::{BulkAddResult, DocumentInput, DocumentStore, SharedDocumentStore};
