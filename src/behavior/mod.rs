//! C5 — BehaviorStore (spec §4.5).

pub mod store;

pub use store::{BehaviorStore, Sequences, SharedBehaviorStore};
