//! Thin HTTP shell over [`crate::orchestrator::Orchestrator`] (spec §6).
//! Deliberately outside the core's scope but carried here as the outer
//! surface — JSON request/response plumbing only, no ranking logic.

mod handlers;
mod types;

pub use handlers::{router, AppState};
