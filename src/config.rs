//! Top-level configuration (spec §6 "Configuration"), following the
//! teacher's `IndexConfig`/`IndexConfigBuilder` split (engine/config.rs):
//! a plain serde-derived struct for the values, a builder for ergonomic
//! in-process construction, and a free function for loading from TOML.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub keyword_weight: f32,
    pub vector_weight: f32,
    pub personalization_weight: f32,
    pub max_suggestions: usize,
    pub min_score: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            keyword_weight: 0.7,
            vector_weight: 0.3,
            personalization_weight: 0.2,
            max_suggestions: 10,
            min_score: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedderConfig {
    pub model: String,
    pub dimension: usize,
    pub cache_size: usize,
    pub max_input_chars: usize,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            model: "hashing-v1".to_string(),
            dimension: 128,
            cache_size: 10_000,
            max_input_chars: 512,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    pub enabled: bool,
    pub history_cap: usize,
    pub preference_ttl_secs: u64,
    pub top_preferences: usize,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            history_cap: 100,
            preference_ttl_secs: 30 * 24 * 3600,
            top_preferences: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefixConfigOpts {
    pub enabled: bool,
    pub min_tokens: usize,
    pub min_tail_chars: usize,
    pub candidate_limit: usize,
    pub result_limit: usize,
    pub min_preserved: usize,
}

impl Default for PrefixConfigOpts {
    fn default() -> Self {
        Self {
            enabled: true,
            min_tokens: 5,
            min_tail_chars: 1,
            candidate_limit: 20,
            result_limit: 5,
            min_preserved: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub enabled: bool,
    pub provider: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_ms: u64,
    pub endpoint: Option<String>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: "none".to_string(),
            model: String::new(),
            temperature: 0.2,
            max_tokens: 256,
            timeout_ms: 1000,
            endpoint: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    pub lex_ms: u64,
    pub vec_ms: u64,
    pub embed_ms: u64,
    pub behavior_ms: u64,
    pub oracle_ms: u64,
    pub total_ms: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            lex_ms: 200,
            vec_ms: 200,
            embed_ms: 500,
            behavior_ms: 100,
            oracle_ms: 1000,
            total_ms: 1500,
        }
    }
}

impl TimeoutsConfig {
    pub fn lex(&self) -> Duration {
        Duration::from_millis(self.lex_ms)
    }
    pub fn vec(&self) -> Duration {
        Duration::from_millis(self.vec_ms)
    }
    pub fn embed(&self) -> Duration {
        Duration::from_millis(self.embed_ms)
    }
    pub fn behavior(&self) -> Duration {
        Duration::from_millis(self.behavior_ms)
    }
    pub fn oracle(&self) -> Duration {
        Duration::from_millis(self.oracle_ms)
    }
    pub fn total(&self) -> Duration {
        Duration::from_millis(self.total_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    pub embedder: EmbedderConfig,
    pub behavior: BehaviorConfig,
    pub prefix: PrefixConfigOpts,
    pub oracle: OracleConfig,
    pub timeouts: TimeoutsConfig,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}

#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn search(mut self, search: SearchConfig) -> Self {
        self.config.search = search;
        self
    }

    pub fn embedder(mut self, embedder: EmbedderConfig) -> Self {
        self.config.embedder = embedder;
        self
    }

    pub fn behavior(mut self, behavior: BehaviorConfig) -> Self {
        self.config.behavior = behavior;
        self
    }

    pub fn prefix(mut self, prefix: PrefixConfigOpts) -> Self {
        self.config.prefix = prefix;
        self
    }

    pub fn oracle(mut self, oracle: OracleConfig) -> Self {
        self.config.oracle = oracle;
        self
    }

    pub fn timeouts(mut self, timeouts: TimeoutsConfig) -> Self {
        self.config.timeouts = timeouts;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_section_6() {
        let config = Config::default();
        assert_eq!(config.search.keyword_weight, 0.7);
        assert_eq!(config.search.vector_weight, 0.3);
        assert_eq!(config.prefix.min_tokens, 5);
        assert_eq!(config.timeouts.total_ms, 1500);
    }

    #[test]
    fn round_trips_through_toml() {
        let config = Config::builder()
            .search(SearchConfig {
                max_suggestions: 25,
                ..Default::default()
            })
            .build();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed = Config::from_toml_str(&toml_str).unwrap();
        assert_eq!(parsed.search.max_suggestions, 25);
    }

    #[test]
    fn partial_toml_fills_remaining_fields_with_defaults() {
        let parsed = Config::from_toml_str("[search]\nmax_suggestions = 5\n").unwrap();
        assert_eq!(parsed.search.max_suggestions, 5);
        assert_eq!(parsed.search.keyword_weight, 0.7);
        assert_eq!(parsed.embedder.dimension, 128);
    }
}
