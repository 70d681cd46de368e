//! C10 — Orchestrator (spec §4.10): the public service surface. Wires
//! together every other component per construction-time dependency
//! injection (spec §9: "Cycles are avoided by construction-time dependency
//! injection; no back-references are required") and exposes the entry
//! points consumed by the HTTP shell.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info_span, warn};

use crate::behavior::{BehaviorStore, SharedBehaviorStore};
use crate::config::Config;
use crate::context::QueryContext;
use crate::data::{normalize_for_dedup, Source, Suggestion};
use crate::embedding::{Embedder, EmbeddingProvider, HashingEmbedder};
use crate::error::{QaError, Result};
use crate::hybrid::{HybridHit, HybridSearcher, HybridWeights};
use crate::lexical::{LexicalIndex, LexicalWeights, SharedLexicalIndex};
use crate::oracle::{NullOracle, OracleClient};
use crate::prefix::{PrefixCompletionEngine, PrefixConfig};
use crate::ranker::{Ranker, RankerWeights};
use crate::reconciliation::ReconciliationLog;
use crate::store::{BulkAddResult, DocumentInput, DocumentStore, SharedDocumentStore};
use crate::vector::{SharedVectorIndex, VectorIndex};

const MAX_LIMIT: usize = 50;

pub struct Orchestrator {
    config: Config,
    lexical: SharedLexicalIndex,
    vector: SharedVectorIndex,
    embedding_provider: Arc<EmbeddingProvider>,
    document_store: SharedDocumentStore,
    behavior: SharedBehaviorStore,
    oracle: Arc<dyn OracleClient>,
    reconciliation: Arc<ReconciliationLog>,
}

impl Orchestrator {
    /// Construction-time lifecycle (spec §9: "an explicit `initialize(config)
    /// → handle` ... lifecycle"). Uses a deterministic feature-hashing
    /// embedder and no oracle by default; see [`Self::with_components`] to
    /// inject real ones.
    pub fn initialize(config: Config) -> Arc<Self> {
        let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::new(config.embedder.dimension));
        Self::with_components(config, embedder, Arc::new(NullOracle))
    }

    pub fn with_components(config: Config, embedder: Arc<dyn Embedder>, oracle: Arc<dyn OracleClient>) -> Arc<Self> {
        let lexical = Arc::new(LexicalIndex::new(LexicalWeights::default()));
        let vector = Arc::new(VectorIndex::new(config.embedder.dimension));
        let embedding_provider = Arc::new(EmbeddingProvider::new(
            embedder,
            config.embedder.cache_size,
            config.embedder.max_input_chars,
        ));
        let reconciliation = Arc::new(ReconciliationLog::default());
        let document_store = Arc::new(DocumentStore::new(
            Arc::clone(&lexical),
            Arc::clone(&vector),
            Arc::clone(&embedding_provider),
            Arc::clone(&reconciliation),
        ));
        let behavior = Arc::new(BehaviorStore::new(
            config.behavior.history_cap,
            std::time::Duration::from_secs(config.behavior.preference_ttl_secs),
            config.behavior.top_preferences,
        ));

        Arc::new(Self {
            config,
            lexical,
            vector,
            embedding_provider,
            document_store,
            behavior,
            oracle,
            reconciliation,
        })
    }

    pub fn reconciliation_log(&self) -> &Arc<ReconciliationLog> {
        &self.reconciliation
    }

    fn validate_request(&self, query: &str, limit: usize) -> Result<usize> {
        if query.trim().is_empty() {
            return Err(QaError::invalid_argument("query must not be empty"));
        }
        if limit == 0 || limit > MAX_LIMIT {
            return Err(QaError::invalid_argument(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }
        Ok(limit)
    }

    fn hybrid_searcher(&self) -> HybridSearcher {
        HybridSearcher::new(
            Arc::clone(&self.lexical),
            Arc::clone(&self.vector),
            self.config.timeouts.lex(),
            self.config.timeouts.vec(),
        )
    }

    fn ranker(&self) -> Ranker {
        Ranker::new(
            Arc::clone(&self.behavior),
            RankerWeights {
                personalization_alpha: self.config.search.personalization_weight,
                exact_match_beta: 0.3,
                min_score: self.config.search.min_score,
            },
        )
    }

    /// **get_suggestions** (spec §4.10): tries prefix-preserving completion
    /// first when it applies, otherwise runs the full hybrid + oracle
    /// expansion + ranking path, all under the total request budget
    /// `T_total`.
    pub async fn get_suggestions(
        &self,
        query: &str,
        user: Option<&str>,
        limit: usize,
        min_score: Option<f32>,
        context: Option<&QueryContext>,
    ) -> Result<Vec<Suggestion>> {
        let limit = self.validate_request(query, limit)?;
        let span = info_span!("get_suggestions", query, user = user.unwrap_or("-"), limit);
        let _enter = span.enter();

        let work = self.get_suggestions_inner(query, user, limit, min_score, context);
        match tokio::time::timeout(self.config.timeouts.total(), work).await {
            Ok(result) => result,
            Err(_) => Err(QaError::unavailable("request exceeded total time budget")),
        }
    }

    async fn get_suggestions_inner(
        &self,
        query: &str,
        user: Option<&str>,
        limit: usize,
        min_score: Option<f32>,
        context: Option<&QueryContext>,
    ) -> Result<Vec<Suggestion>> {
        if self.config.prefix.enabled {
            let prefix_engine = PrefixCompletionEngine::new(
                Arc::clone(&self.lexical),
                Arc::clone(&self.oracle),
                PrefixConfig {
                    min_tokens: self.config.prefix.min_tokens,
                    min_tail_chars: self.config.prefix.min_tail_chars,
                    candidate_limit: self.config.prefix.candidate_limit,
                    result_limit: self.config.prefix.result_limit,
                    min_preserved: self.config.prefix.min_preserved,
                },
            );
            let oracle_context = context.and_then(|c| c.as_oracle_context());
            if let Some(suggestions) = prefix_engine.complete(query, oracle_context.as_deref()).await {
                return Ok(suggestions);
            }
        }

        let embedding = match self.embedding_provider.embed(query).await {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(error = %e, "embedding failed, degrading to keyword-only");
                None
            }
        };

        let expansions = if self.oracle.is_available() {
            tokio::time::timeout(self.config.timeouts.oracle(), self.oracle.expand_query(query, 3))
                .await
                .ok()
                .and_then(|r| r.ok())
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        let hybrid = self.hybrid_searcher();
        let weights = HybridWeights {
            keyword: self.config.search.keyword_weight,
            vector: self.config.search.vector_weight,
        };

        let mut original_hits = hybrid
            .search(query, embedding.as_deref(), weights, 50, 50)
            .await?;
        for hit in &mut original_hits {
            hit.score *= 1.1;
        }

        let mut combined: HashMap<String, HybridHit> = HashMap::new();
        for hit in original_hits {
            combined.insert(hit.id.clone(), hit);
        }
        for expansion in &expansions {
            if let Ok(expansion_hits) = hybrid.search(expansion, None, weights, 50, 50).await {
                for hit in expansion_hits {
                    combined
                        .entry(hit.id.clone())
                        .and_modify(|existing| {
                            if hit.score > existing.score {
                                *existing = hit.clone();
                            }
                        })
                        .or_insert(hit);
                }
            }
        }

        let ranker = Ranker::new(
            Arc::clone(&self.behavior),
            RankerWeights {
                personalization_alpha: self.config.search.personalization_weight,
                exact_match_beta: 0.3,
                min_score: min_score.unwrap_or(self.config.search.min_score),
            },
        );

        Ok(ranker.rank(query, user, combined.into_values().collect(), limit))
    }

    /// **get_similar_queries** (spec §4.10): canonicalized to hybrid search
    /// with `w_kw = 0, w_vec = 1` (spec §9 open question resolution).
    pub async fn get_similar_queries(&self, query: &str, user: Option<&str>, limit: usize) -> Result<Vec<Suggestion>> {
        let limit = self.validate_request(query, limit)?;
        let embedding = self.embedding_provider.embed(query).await.ok();
        let hybrid = self.hybrid_searcher();
        let hits = hybrid
            .search(query, embedding.as_deref(), HybridWeights { keyword: 0.0, vector: 1.0 }, 50, 50)
            .await?;
        Ok(self.ranker().rank(query, user, hits, limit))
    }

    /// **get_related_queries** (spec §4.10): union of oracle, sequence-next,
    /// hybrid, history, and sequence-previous sources, deduplicated by
    /// case-insensitive whitespace-normalized text, highest score wins.
    pub async fn get_related_queries(&self, query: &str, user: Option<&str>, limit: usize) -> Result<Vec<Suggestion>> {
        let limit = self.validate_request(query, limit)?;
        let mut candidates: Vec<Suggestion> = Vec::new();

        if self.oracle.is_available() {
            if let Ok(Ok(related)) = tokio::time::timeout(
                self.config.timeouts.oracle(),
                self.oracle.generate_related(query, None, 5),
            )
            .await
            {
                for (i, text) in related.into_iter().enumerate() {
                    let score = 0.95 - (i as f32 * 0.01).min(0.05);
                    candidates.push(Suggestion::new(text, score, Source::Llm));
                }
            }
        }

        let sequences = self.behavior.get_sequences(query, user);
        let next_max = sequences.next.iter().map(|(_, w)| *w).max().unwrap_or(1).max(1);
        for (q, weight) in &sequences.next {
            let normalized = *weight as f32 / next_max as f32;
            candidates.push(Suggestion::new(q.clone(), 0.85 * normalized, Source::SequenceNext));
        }

        let hybrid = self.hybrid_searcher();
        let embedding = self.embedding_provider.embed(query).await.ok();
        if let Ok(hits) = hybrid
            .search(query, embedding.as_deref(), HybridWeights::default(), 50, 50)
            .await
        {
            for hit in hits {
                candidates.push(Suggestion::new(hit.text, hit.score.min(0.80), Source::Hybrid));
            }
        }

        if let Some(user) = user {
            for entry in self.behavior.get_history(user) {
                if entry.query == query {
                    candidates.push(Suggestion::new(entry.selected_text, 0.70, Source::History));
                }
            }
        }

        let prev_max = sequences.previous.iter().map(|(_, w)| *w).max().unwrap_or(1).max(1);
        for (q, weight) in &sequences.previous {
            let normalized = *weight as f32 / prev_max as f32;
            candidates.push(Suggestion::new(q.clone(), 0.75 * normalized, Source::SequencePrev));
        }

        let mut best: HashMap<String, Suggestion> = HashMap::new();
        for candidate in candidates {
            let key = normalize_for_dedup(&candidate.text);
            best.entry(key)
                .and_modify(|existing| {
                    if candidate.score > existing.score {
                        *existing = candidate.clone();
                    }
                })
                .or_insert(candidate);
        }

        let mut merged: Vec<Suggestion> = best.into_values().collect();
        merged.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.text.cmp(&b.text))
        });
        merged.truncate(limit);
        Ok(merged)
    }

    /// **record_feedback** (spec §4.10): forwards to `BehaviorStore` and
    /// bumps the document's frequency counter when it can be resolved.
    pub async fn record_feedback(
        &self,
        query: &str,
        selected: &str,
        user: Option<&str>,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<()> {
        if query.trim().is_empty() || selected.trim().is_empty() {
            return Err(QaError::invalid_argument("query and selected_suggestion must not be empty"));
        }
        let timestamp = timestamp.unwrap_or_else(Utc::now);
        let user = user.unwrap_or("anonymous");

        self.behavior.record_selection(user, query, selected, timestamp);

        if let Some(id) = self.document_store.find_id_by_text(selected) {
            self.document_store.increment_frequency(&id, 1);
        }
        Ok(())
    }

    /// **add_document** (spec §4.10).
    pub async fn add_document(
        &self,
        text: &str,
        id: Option<String>,
        keywords: HashSet<String>,
        metadata: HashMap<String, serde_json::Value>,
    ) -> Result<String> {
        if text.trim().is_empty() {
            return Err(QaError::invalid_argument("document text must not be empty"));
        }
        self.document_store
            .add(DocumentInput { id, text: text.to_string(), keywords, metadata })
            .await
    }

    /// **bulk_add_document** (spec §4.10).
    pub async fn bulk_add_document(&self, items: Vec<DocumentInput>) -> BulkAddResult {
        self.document_store.bulk_add(items).await
    }

    pub fn lexical_connected(&self) -> bool {
        true
    }

    pub fn vector_connected(&self) -> bool {
        true
    }

    pub fn behavior_connected(&self) -> bool {
        self.config.behavior.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::collections::HashSet as HSet;

    fn kw(items: &[&str]) -> HSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    async fn seed_s1(orchestrator: &Orchestrator) {
        orchestrator
            .add_document("销售额", Some("1".to_string()), kw(&["销售", "revenue"]), HashMap::new())
            .await
            .unwrap();
        orchestrator
            .add_document("销售额趋势分析", Some("2".to_string()), kw(&["销售", "trend"]), HashMap::new())
            .await
            .unwrap();
        orchestrator
            .add_document("市场分析", Some("3".to_string()), kw(&["market"]), HashMap::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn s1_hybrid_ranking_omits_unrelated_document() {
        let orchestrator = Orchestrator::initialize(Config::default());
        seed_s1(&orchestrator).await;

        let suggestions = orchestrator.get_suggestions("销售", None, 3, None, None).await.unwrap();
        let texts: Vec<&str> = suggestions.iter().map(|s| s.text.as_str()).collect();
        assert!(texts.contains(&"销售额"));
        assert!(texts.contains(&"销售额趋势分析"));
        assert!(!texts.contains(&"市场分析"));
    }

    #[tokio::test]
    async fn s2_personalization_ranks_preferred_document_first() {
        let orchestrator = Orchestrator::initialize(Config::default());
        seed_s1(&orchestrator).await;

        for _ in 0..3 {
            orchestrator.record_feedback("销售", "销售额趋势分析", Some("u1"), None).await.unwrap();
        }

        let suggestions = orchestrator
            .get_suggestions("销售", Some("u1"), 2, None, None)
            .await
            .unwrap();
        assert_eq!(suggestions[0].text, "销售额趋势分析");
    }

    #[tokio::test]
    async fn s6_bulk_add_partial_failure_then_searchable() {
        let orchestrator = Orchestrator::initialize(Config::default());
        let items = vec![
            DocumentInput::new("销售额"),
            DocumentInput::new(""),
            DocumentInput::new("市场趋势"),
        ];
        let result = orchestrator.bulk_add_document(items).await;
        assert_eq!(result.success_count, 2);
        assert_eq!(result.error_count, 1);

        let suggestions = orchestrator.get_suggestions("销售额", None, 5, None, None).await.unwrap();
        assert!(suggestions.iter().any(|s| s.text == "销售额"));
    }

    #[tokio::test]
    async fn empty_query_is_rejected() {
        let orchestrator = Orchestrator::initialize(Config::default());
        let err = orchestrator.get_suggestions("", None, 5, None, None).await.unwrap_err();
        assert!(matches!(err, QaError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn out_of_range_limit_is_rejected() {
        let orchestrator = Orchestrator::initialize(Config::default());
        let err = orchestrator.get_suggestions("销售", None, 51, None, None).await.unwrap_err();
        assert!(matches!(err, QaError::InvalidArgument(_)));
    }
}
