//! Core data model (spec §3): indexable documents, suggestions, and the
//! small value types threaded through every component.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An indexable query/phrase, as described in spec §3.
///
/// Invariants upheld by [`crate::store::DocumentStore`]:
/// (a) `embedding` has L2 norm `1 ± 1e-6` whenever present;
/// (b) `frequency` is monotonically non-decreasing;
/// (c) `id` uniquely resolves one document across the lexical and vector
///     indices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub keywords: HashSet<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub frequency: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            text: text.into(),
            keywords: HashSet::new(),
            metadata: HashMap::new(),
            embedding: Vec::new(),
            frequency: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_keywords(mut self, keywords: impl IntoIterator<Item = String>) -> Self {
        self.keywords = keywords.into_iter().collect();
        self
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// One entry in a user's selection history (spec §3), newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserHistoryEntry {
    pub query: String,
    pub selected_text: String,
    pub timestamp: DateTime<Utc>,
}

/// Where a suggestion's score originated, surfaced verbatim in API responses
/// (spec §6, "Source tags").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Keyword,
    Vector,
    Hybrid,
    Personalized,
    History,
    SequenceNext,
    SequencePrev,
    Llm,
    PrefixPreserved,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Keyword => "keyword",
            Source::Vector => "vector",
            Source::Hybrid => "hybrid",
            Source::Personalized => "personalized",
            Source::History => "history",
            Source::SequenceNext => "sequence_next",
            Source::SequencePrev => "sequence_prev",
            Source::Llm => "llm",
            Source::PrefixPreserved => "prefix_preserved",
        }
    }
}

/// A single ranked suggestion returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub text: String,
    pub score: f32,
    pub source: Source,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Suggestion {
    pub fn new(text: impl Into<String>, score: f32, source: Source) -> Self {
        Self {
            text: text.into(),
            score,
            source,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Case-insensitive, whitespace-normalized key used for suggestion dedup
/// (spec §8 property 2, §4.10 "Deduplicate by text").
pub fn normalize_for_dedup(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
