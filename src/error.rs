//! Crate-wide error type.
//!
//! Mirrors the teacher's `IrisError`: a flat, named-variant `thiserror` enum
//! with `Display` messages, rather than a boxed `anyhow::Error`. Only the two
//! externally-visible kinds from spec §7 (validation, unavailable) are meant
//! to escape the [`crate::orchestrator::Orchestrator`] boundary; everything
//! else is logged and swallowed by the component that observed it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QaError {
    /// Malformed request input (spec §7.1). Maps to HTTP 400 at the outer shell.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No candidate source could serve the request (spec §7.2). Maps to HTTP 503.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A dependency call exceeded its budget (spec §5 per-call timeouts).
    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Anything else unexpected; never meant to cross the Orchestrator boundary
    /// on its own, but kept for defensive propagation inside the core.
    #[error("internal error: {0}")]
    Internal(String),
}

impl QaError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<serde_json::Error> for QaError {
    fn from(err: serde_json::Error) -> Self {
        QaError::Internal(format!("json error: {err}"))
    }
}

impl From<toml::de::Error> for QaError {
    fn from(err: toml::de::Error) -> Self {
        QaError::Internal(format!("config parse error: {err}"))
    }
}

impl From<std::io::Error> for QaError {
    fn from(err: std::io::Error) -> Self {
        QaError::Internal(format!("io error: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, QaError>;
