//! Typed request context (SPEC_FULL.md §3: "Dynamic request/context bags →
//! typed structs"). Recognized keys get real fields; anything else lands in
//! `extra` and is ignored by the engine, per spec §9 design note.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryContext {
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub user_history: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl QueryContext {
    pub fn as_oracle_context(&self) -> Option<String> {
        self.domain.clone()
    }
}
