//! C2 — LexicalIndex (spec §4.2): an inverted-index store keyed by document
//! id, searched with three blended modes (phrase-prefix, fuzzy, term).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::fuzzy::fuzzy_match;
use crate::error::Result;
use crate::util::tokenize::{extract_term_candidates, normalize_token, tokenize};

/// Linear combination weights for the three lexical query modes (spec
/// §4.2: "defaults: phrase-prefix 3, fuzzy 1, term 5").
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LexicalWeights {
    pub phrase_prefix: f32,
    pub fuzzy: f32,
    pub term: f32,
}

impl Default for LexicalWeights {
    fn default() -> Self {
        Self {
            phrase_prefix: 3.0,
            fuzzy: 1.0,
            term: 5.0,
        }
    }
}

#[derive(Debug, Clone)]
struct LexicalDoc {
    id: String,
    text: String,
    tokens: Vec<String>,
    keywords: HashSet<String>,
    frequency: u64,
}

/// A single lexical search result.
#[derive(Debug, Clone)]
pub struct LexicalHit {
    pub id: String,
    pub text: String,
    pub score: f32,
    pub frequency: u64,
}

/// Outcome of a bulk write, per spec §4.2: "reports per-document success and
/// accumulates partial failures without aborting the whole batch".
#[derive(Debug, Clone, Default)]
pub struct BulkResult {
    pub success_count: usize,
    pub error_count: usize,
    pub per_id_errors: Vec<(String, String)>,
}

pub struct LexicalIndex {
    weights: LexicalWeights,
    docs: RwLock<HashMap<String, LexicalDoc>>,
    /// Inverted index: normalized keyword -> document ids carrying it.
    postings: RwLock<HashMap<String, HashSet<String>>>,
}

impl LexicalIndex {
    pub fn new(weights: LexicalWeights) -> Self {
        Self {
            weights,
            docs: RwLock::new(HashMap::new()),
            postings: RwLock::new(HashMap::new()),
        }
    }

    /// Atomically insert or replace a document (spec §4.2: "`upsert(doc)` is
    /// atomic per document").
    pub fn upsert(&self, id: &str, text: &str, keywords: &HashSet<String>, frequency: u64) -> Result<()> {
        if text.trim().is_empty() {
            return Err(crate::error::QaError::invalid_argument(
                "document text must not be empty",
            ));
        }

        let tokens: Vec<String> = tokenize(text).into_iter().map(|t| normalize_token(&t.text)).collect();
        let normalized_keywords: HashSet<String> = keywords.iter().map(|k| normalize_token(k)).collect();

        let doc = LexicalDoc {
            id: id.to_string(),
            text: text.to_string(),
            tokens,
            keywords: normalized_keywords.clone(),
            frequency,
        };

        let mut docs = self.docs.write();
        let mut postings = self.postings.write();

        if let Some(old) = docs.get(id) {
            for kw in &old.keywords {
                if let Some(set) = postings.get_mut(kw) {
                    set.remove(id);
                }
            }
        }
        for kw in &normalized_keywords {
            postings.entry(kw.clone()).or_default().insert(id.to_string());
        }

        docs.insert(id.to_string(), doc);
        Ok(())
    }

    /// Batch write. Never aborts on a single bad document.
    pub fn bulk_upsert(&self, items: &[(String, String, HashSet<String>, u64)]) -> BulkResult {
        let mut result = BulkResult::default();
        for (id, text, keywords, frequency) in items {
            match self.upsert(id, text, keywords, *frequency) {
                Ok(()) => result.success_count += 1,
                Err(e) => {
                    result.error_count += 1;
                    result.per_id_errors.push((id.clone(), e.to_string()));
                }
            }
        }
        result
    }

    pub fn remove(&self, id: &str) {
        let mut docs = self.docs.write();
        if let Some(doc) = docs.remove(id) {
            let mut postings = self.postings.write();
            for kw in &doc.keywords {
                if let Some(set) = postings.get_mut(kw) {
                    set.remove(id);
                }
            }
        }
    }

    pub fn increment_frequency(&self, id: &str, delta: u64) {
        if let Some(doc) = self.docs.write().get_mut(id) {
            doc.frequency += delta;
        }
    }

    pub fn get_frequency(&self, id: &str) -> Option<u64> {
        self.docs.read().get(id).map(|d| d.frequency)
    }

    pub fn get_text(&self, id: &str) -> Option<String> {
        self.docs.read().get(id).map(|d| d.text.clone())
    }

    /// Find the document id(s) whose text equals `text` exactly.
    pub fn find_by_text(&self, text: &str) -> Vec<String> {
        self.docs
            .read()
            .values()
            .filter(|d| d.text == text)
            .map(|d| d.id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }

    /// Run all three query modes against `query` and blend their scores.
    pub fn search(&self, query: &str, max_results: usize) -> Result<Vec<LexicalHit>> {
        let query_tokens: Vec<String> = tokenize(query).into_iter().map(|t| normalize_token(&t.text)).collect();
        if query_tokens.is_empty() {
            return Ok(Vec::new());
        }

        let docs = self.docs.read();
        let postings = self.postings.read();

        // Term mode operates on whole semantic units (keywords are supplied
        // pre-tokenized, e.g. "销售"), so it uses a coarser extraction than
        // the per-codepoint tokens used for phrase-prefix/fuzzy.
        let term_query_tokens: Vec<String> = extract_term_candidates(query)
            .into_iter()
            .map(|t| normalize_token(&t))
            .collect();

        let mut term_candidates: HashSet<String> = HashSet::new();
        for tok in &term_query_tokens {
            if let Some(ids) = postings.get(tok) {
                term_candidates.extend(ids.iter().cloned());
            }
        }

        let mut scored: Vec<LexicalHit> = Vec::new();
        for doc in docs.values() {
            let prefix_score = phrase_prefix_score(&query_tokens, &doc.tokens);
            let fuzzy_score = fuzzy_score(&query_tokens, &doc.tokens);
            let term_score = if term_candidates.contains(&doc.id) {
                term_match_count(&term_query_tokens, &doc.keywords)
            } else {
                0.0
            };

            if prefix_score == 0.0 && fuzzy_score == 0.0 && term_score == 0.0 {
                continue;
            }

            let raw = self.weights.phrase_prefix * prefix_score
                + self.weights.fuzzy * fuzzy_score
                + self.weights.term * term_score
                + (1.0 + doc.frequency as f32).ln();

            scored.push(LexicalHit {
                id: doc.id.clone(),
                text: doc.text.clone(),
                score: raw,
                frequency: doc.frequency,
            });
        }

        // Deterministic tie-break (spec §4.2): higher score, then higher
        // frequency, then lexicographically smaller id.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.frequency.cmp(&a.frequency))
                .then_with(|| a.id.cmp(&b.id))
        });
        scored.truncate(max_results);
        Ok(scored)
    }
}

/// Score proportional to the number of leading query tokens the document's
/// text begins with, in order (spec §4.2.1).
fn phrase_prefix_score(query_tokens: &[String], doc_tokens: &[String]) -> f32 {
    let mut matched = 0usize;
    for (q, d) in query_tokens.iter().zip(doc_tokens.iter()) {
        if q == d {
            matched += 1;
        } else {
            break;
        }
    }
    matched as f32
}

/// Count of query tokens that fuzzy-match (edit distance ≤ 2) some token in
/// the document (spec §4.2.2). Single-codepoint tokens are excluded: every
/// pair of distinct single characters is distance 1, which would make every
/// CJK document fuzzy-match every other one.
fn fuzzy_score(query_tokens: &[String], doc_tokens: &[String]) -> f32 {
    let mut matched = 0usize;
    for q in query_tokens {
        if q.chars().count() < 2 {
            continue;
        }
        if doc_tokens
            .iter()
            .filter(|d| d.chars().count() >= 2)
            .any(|d| fuzzy_match(q, d, 2))
        {
            matched += 1;
        }
    }
    matched as f32
}

/// Exact intersection count between query tokens and document keywords
/// (spec §4.2.3).
fn term_match_count(query_tokens: &[String], keywords: &HashSet<String>) -> f32 {
    query_tokens.iter().filter(|q| keywords.contains(*q)).count() as f32
}

pub type SharedLexicalIndex = Arc<LexicalIndex>;

#[cfg(test)]
mod tests {
    use super::*;

    fn kw(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn phrase_prefix_beats_unrelated_document() {
        let idx = LexicalIndex::new(LexicalWeights::default());
        idx.upsert("1", "销售额", &kw(&["销售", "revenue"]), 0).unwrap();
        idx.upsert("2", "销售额趋势分析", &kw(&["销售", "trend"]), 0).unwrap();
        idx.upsert("3", "市场分析", &kw(&["market"]), 0).unwrap();

        let hits = idx.search("销售", 10).unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert!(ids.contains(&"1"));
        assert!(ids.contains(&"2"));
        assert!(!ids.contains(&"3"));
    }

    #[test]
    fn bulk_upsert_reports_partial_failure() {
        let idx = LexicalIndex::new(LexicalWeights::default());
        let items = vec![
            ("1".to_string(), "销售额".to_string(), kw(&["销售"]), 0),
            ("2".to_string(), "".to_string(), kw(&[]), 0),
            ("3".to_string(), "市场趋势".to_string(), kw(&[]), 0),
        ];
        let result = idx.bulk_upsert(&items);
        assert_eq!(result.success_count, 2);
        assert_eq!(result.error_count, 1);
        assert_eq!(result.per_id_errors.len(), 1);
        assert_eq!(result.per_id_errors[0].0, "2");
    }

    #[test]
    fn ties_break_by_frequency_then_id() {
        let idx = LexicalIndex::new(LexicalWeights::default());
        idx.upsert("b", "销售额", &kw(&["销售"]), 5).unwrap();
        idx.upsert("a", "销售额", &kw(&["销售"]), 5).unwrap();
        let hits = idx.search("销售额", 10).unwrap();
        assert_eq!(hits[0].id, "a");
    }

    #[test]
    fn increment_frequency_affects_score_order() {
        let idx = LexicalIndex::new(LexicalWeights::default());
        idx.upsert("1", "销售额", &kw(&["销售"]), 0).unwrap();
        idx.upsert("2", "销售额", &kw(&["销售"]), 0).unwrap();
        idx.increment_frequency("2", 100);
        let hits = idx.search("销售额", 10).unwrap();
        assert_eq!(hits[0].id, "2");
    }
}
