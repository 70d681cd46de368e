//! C8 — PrefixCompletionEngine (spec §4.8): treats a long, partially-typed
//! query as `[stable prefix] + [incomplete tail]` and completes only the
//! tail, preserving everything the user has already typed.

use std::sync::Arc;

use crate::data::{Source, Suggestion};
use crate::lexical::SharedLexicalIndex;
use crate::oracle::OracleClient;
use crate::util::tokenize::tokenize;

#[derive(Debug, Clone, Copy)]
pub struct PrefixConfig {
    pub min_tokens: usize,
    pub min_tail_chars: usize,
    pub candidate_limit: usize,
    pub result_limit: usize,
    pub min_preserved: usize,
}

impl Default for PrefixConfig {
    fn default() -> Self {
        Self {
            min_tokens: 5,
            min_tail_chars: 1,
            candidate_limit: 20,
            result_limit: 5,
            min_preserved: 1,
        }
    }
}

pub struct PrefixCompletionEngine {
    lexical: SharedLexicalIndex,
    oracle: Arc<dyn OracleClient>,
    config: PrefixConfig,
}

impl PrefixCompletionEngine {
    pub fn new(lexical: SharedLexicalIndex, oracle: Arc<dyn OracleClient>, config: PrefixConfig) -> Self {
        Self { lexical, oracle, config }
    }

    /// Whether `query` meets the trigger conditions (spec §4.8: "≥
    /// τ_tokens tokens AND the trailing token has ≥ τ_tail chars").
    pub fn should_trigger(&self, query: &str) -> bool {
        let tokens = tokenize(query);
        if tokens.len() < self.config.min_tokens {
            return false;
        }
        match tokens.last() {
            Some(tail) => tail.text.chars().count() >= self.config.min_tail_chars,
            None => false,
        }
    }

    /// Splits `query` into the stable prefix (with original separators
    /// preserved) and the incomplete trailing tail.
    fn split_prefix_tail(query: &str) -> (String, String) {
        let tokens = tokenize(query);
        match tokens.last() {
            Some(tail) => (query[..tail.start].to_string(), query[tail.start..].to_string()),
            None => (query.to_string(), String::new()),
        }
    }

    /// Runs the full algorithm (spec §4.8 steps 1-5). Returns `None` if the
    /// trigger conditions don't hold, or fewer than `min_preserved`
    /// completions were produced — both signal the orchestrator to fall
    /// back to the regular suggestion path.
    pub async fn complete(&self, query: &str, context: Option<&str>) -> Option<Vec<Suggestion>> {
        if !self.should_trigger(query) {
            return None;
        }

        let (prefix, tail) = Self::split_prefix_tail(query);
        if tail.is_empty() {
            return None;
        }

        let candidates = self
            .lexical
            .search(&tail, self.config.candidate_limit)
            .unwrap_or_default();
        if candidates.is_empty() {
            return None;
        }

        let candidate_texts: Vec<String> = candidates
            .iter()
            .filter_map(|c| c.text.strip_prefix(&tail).map(|t| t.to_string()))
            .collect();

        let suggestions = if self.oracle.is_available() {
            match self
                .oracle
                .rank_prefix_completions(&prefix, &tail, &candidate_texts, context)
                .await
            {
                Ok(ranked) if !ranked.is_empty() => ranked
                    .into_iter()
                    .map(|r| self.build_suggestion(&prefix, &tail, &r.text, r.score, "oracle"))
                    .collect(),
                _ => self.fallback_rank(&prefix, &tail, &candidates),
            }
        } else {
            self.fallback_rank(&prefix, &tail, &candidates)
        };

        if suggestions.len() < self.config.min_preserved {
            return None;
        }

        let mut out = suggestions;
        out.truncate(self.config.result_limit);
        Some(out)
    }

    /// Score by `lex_norm + log(1 + frequency)/C` when no oracle is
    /// available (spec §4.8 step 3, fallback branch).
    fn fallback_rank(&self, prefix: &str, tail: &str, candidates: &[crate::lexical::LexicalHit]) -> Vec<Suggestion> {
        const POPULARITY_DAMPING: f32 = 10.0;
        let max_score = candidates.iter().map(|c| c.score).fold(0.0_f32, f32::max);

        let mut scored: Vec<(f32, String, crate::lexical::LexicalHit)> = candidates
            .iter()
            .filter_map(|c| {
                let completed_tail = c.text.strip_prefix(tail)?.to_string();
                let lex_norm = if max_score > 0.0 { c.score / max_score } else { 0.0 };
                let score = lex_norm + (1.0 + c.frequency as f32).ln() / POPULARITY_DAMPING;
                Some((score, completed_tail, c.clone()))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.2.frequency.cmp(&a.2.frequency))
                .then_with(|| a.2.id.cmp(&b.2.id))
        });

        scored
            .into_iter()
            .map(|(score, completed_tail, _)| self.build_suggestion(prefix, tail, &completed_tail, score, "fallback"))
            .collect()
    }

    fn build_suggestion(&self, prefix: &str, tail: &str, completed_tail: &str, score: f32, method: &str) -> Suggestion {
        let text = format!("{prefix}{tail}{completed_tail}");
        Suggestion::new(text, score, Source::PrefixPreserved)
            .with_metadata("prefix", prefix)
            .with_metadata("incomplete_term", tail)
            .with_metadata("completed_term", completed_tail)
            .with_metadata("method", method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexical::{LexicalIndex, LexicalWeights};
    use crate::oracle::NullOracle;
    use std::collections::HashSet;

    fn build_index() -> SharedLexicalIndex {
        let idx = Arc::new(LexicalIndex::new(LexicalWeights::default()));
        idx.upsert("1", "销售额", &HashSet::new(), 0).unwrap();
        idx.upsert("2", "销量", &HashSet::new(), 0).unwrap();
        idx.upsert("3", "销售情况", &HashSet::new(), 0).unwrap();
        idx
    }

    #[test]
    fn trigger_requires_enough_tokens_and_tail_length() {
        let idx = build_index();
        let engine = PrefixCompletionEngine::new(idx, Arc::new(NullOracle), PrefixConfig::default());
        assert!(engine.should_trigger("帮我查询一下今年北京的销"));
        assert!(!engine.should_trigger("北京"));
    }

    #[tokio::test]
    async fn completions_preserve_the_typed_prefix() {
        let idx = build_index();
        let engine = PrefixCompletionEngine::new(idx, Arc::new(NullOracle), PrefixConfig::default());
        let suggestions = engine
            .complete("帮我查询一下今年北京的销", None)
            .await
            .expect("expected preserved completions");
        assert!(!suggestions.is_empty());
        for s in &suggestions {
            assert!(s.text.starts_with("帮我查询一下今年北京的"));
            assert_eq!(s.source.as_str(), "prefix_preserved");
        }
    }

    #[tokio::test]
    async fn returns_none_when_trigger_conditions_not_met() {
        let idx = build_index();
        let engine = PrefixCompletionEngine::new(idx, Arc::new(NullOracle), PrefixConfig::default());
        assert!(engine.complete("北京", None).await.is_none());
    }
}
