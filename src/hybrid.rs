//! C6 — HybridSearcher (spec §4.6): fans out lexical and vector search in
//! parallel, normalizes each leg onto `[0, 1]`, and blends by configured
//! weight. Grounded on the teacher's `Engine::fuse_results` (engine.rs) —
//! same shape (two legs, a merge map keyed by id, degrade to
//! single-leg-only when the other is empty) but a weighted-sum blend over
//! normalized scores rather than RRF, since spec §4.6 pins the formula.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::data::Source;
use crate::error::{QaError, Result};
use crate::lexical::SharedLexicalIndex;
use crate::vector::SharedVectorIndex;

#[derive(Debug, Clone, Copy)]
pub struct HybridWeights {
    pub keyword: f32,
    pub vector: f32,
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self {
            keyword: 0.7,
            vector: 0.3,
        }
    }
}

/// One blended candidate (spec §4.6: "one entry per id").
#[derive(Debug, Clone)]
pub struct HybridHit {
    pub id: String,
    pub text: String,
    pub score: f32,
    pub source: Source,
    pub frequency: u64,
    pub raw_lexical: f32,
}

pub struct HybridSearcher {
    lexical: SharedLexicalIndex,
    vector: SharedVectorIndex,
    lex_timeout: Duration,
    vec_timeout: Duration,
}

impl HybridSearcher {
    pub fn new(
        lexical: SharedLexicalIndex,
        vector: SharedVectorIndex,
        lex_timeout: Duration,
        vec_timeout: Duration,
    ) -> Self {
        Self {
            lexical,
            vector,
            lex_timeout,
            vec_timeout,
        }
    }

    /// Runs the lexical and vector legs concurrently, each under its own
    /// timeout (spec §5), and blends what came back. Returns an error only
    /// when *both* legs failed (spec §7 item 2); a single leg's failure
    /// degrades to the other leg's results (spec §7 item 3).
    pub async fn search(
        &self,
        query: &str,
        embedding: Option<&[f32]>,
        weights: HybridWeights,
        k_lex: usize,
        k_vec: usize,
    ) -> Result<Vec<HybridHit>> {
        let lexical = Arc::clone(&self.lexical);
        let query_owned = query.to_string();
        let lex_timeout = self.lex_timeout;
        let lexical_fut = async move {
            tokio::time::timeout(
                lex_timeout,
                tokio::task::spawn_blocking(move || lexical.search(&query_owned, k_lex)),
            )
            .await
        };

        let vector = Arc::clone(&self.vector);
        let vec_timeout = self.vec_timeout;
        let embedding_owned = embedding.map(|e| e.to_vec());
        let vector_fut = async move {
            match embedding_owned {
                None => Ok(Ok(Ok(Vec::new()))),
                Some(vec) => {
                    tokio::time::timeout(
                        vec_timeout,
                        tokio::task::spawn_blocking(move || vector.search(&vec, k_vec)),
                    )
                    .await
                }
            }
        };

        let (lex_result, vec_result) = tokio::join!(lexical_fut, vector_fut);

        let lexical_hits = match lex_result {
            Ok(Ok(Ok(hits))) => Some(hits),
            Ok(Ok(Err(e))) => {
                warn!(error = %e, "lexical leg returned an error");
                None
            }
            Ok(Err(e)) => {
                warn!(error = %e, "lexical leg task panicked");
                None
            }
            Err(_) => {
                warn!(timeout = ?self.lex_timeout, "lexical leg timed out");
                None
            }
        };

        let vector_hits = match vec_result {
            Ok(Ok(Ok(hits))) => Some(hits),
            Ok(Ok(Err(e))) => {
                warn!(error = %e, "vector leg returned an error");
                None
            }
            Ok(Err(e)) => {
                warn!(error = %e, "vector leg task panicked");
                None
            }
            Err(_) => {
                warn!(timeout = ?self.vec_timeout, "vector leg timed out");
                None
            }
        };

        if lexical_hits.is_none() && vector_hits.is_none() {
            return Err(QaError::unavailable("both lexical and vector search legs failed"));
        }

        let lexical_hits = lexical_hits.unwrap_or_default();
        let vector_hits = vector_hits.unwrap_or_default();

        let lex_max = lexical_hits.iter().map(|h| h.score).fold(0.0_f32, f32::max);

        let mut merged: HashMap<String, HybridHit> = HashMap::new();

        for hit in &lexical_hits {
            let norm = if lex_max > 0.0 { hit.score / lex_max } else { 0.0 };
            merged.insert(
                hit.id.clone(),
                HybridHit {
                    id: hit.id.clone(),
                    text: hit.text.clone(),
                    score: weights.keyword * norm,
                    source: Source::Keyword,
                    frequency: hit.frequency,
                    raw_lexical: hit.score,
                },
            );
        }

        for hit in &vector_hits {
            let norm = (hit.similarity + 1.0) / 2.0;
            let contribution = weights.vector * norm;
            merged
                .entry(hit.id.clone())
                .and_modify(|existing| {
                    existing.score += contribution;
                    existing.source = Source::Hybrid;
                })
                .or_insert_with(|| HybridHit {
                    id: hit.id.clone(),
                    text: self.lexical.get_text(&hit.id).unwrap_or_default(),
                    score: contribution,
                    source: Source::Vector,
                    frequency: self.lexical.get_frequency(&hit.id).unwrap_or(0),
                    raw_lexical: 0.0,
                });
        }

        let mut hits: Vec<HybridHit> = merged.into_values().collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.raw_lexical.partial_cmp(&a.raw_lexical).unwrap_or(std::cmp::Ordering::Equal))
                .then_with(|| b.frequency.cmp(&a.frequency))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(hits)
    }
}
