//! C4 — DocumentStore (spec §4.4): the combined write path to the lexical
//! and vector indices, with id assignment and half-failure handling.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;

use crate::embedding::EmbeddingProvider;
use crate::error::{QaError, Result};
use crate::lexical::SharedLexicalIndex;
use crate::reconciliation::{FailedLeg, ReconciliationLog};
use crate::util::id::stable_id;
use crate::vector::SharedVectorIndex;

/// A single document submission for `add`/`bulk_add`.
#[derive(Debug, Clone, Default)]
pub struct DocumentInput {
    pub id: Option<String>,
    pub text: String,
    pub keywords: HashSet<String>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl DocumentInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Outcome of `bulk_add` (spec §4.4: "returns `{success_count, error_count,
/// per_id_errors}`").
#[derive(Debug, Clone, Default)]
pub struct BulkAddResult {
    pub success_count: usize,
    pub error_count: usize,
    pub per_id_errors: Vec<(String, String)>,
    pub ids: Vec<String>,
}

pub struct DocumentStore {
    lexical: SharedLexicalIndex,
    vector: SharedVectorIndex,
    embedder: Arc<EmbeddingProvider>,
    reconciliation: Arc<ReconciliationLog>,
}

impl DocumentStore {
    pub fn new(
        lexical: SharedLexicalIndex,
        vector: SharedVectorIndex,
        embedder: Arc<EmbeddingProvider>,
        reconciliation: Arc<ReconciliationLog>,
    ) -> Self {
        Self {
            lexical,
            vector,
            embedder,
            reconciliation,
        }
    }

    pub fn lexical(&self) -> &SharedLexicalIndex {
        &self.lexical
    }

    pub fn vector(&self) -> &SharedVectorIndex {
        &self.vector
    }

    /// Insert or replace a document. Computes a stable id from `text` if
    /// none is given (spec §8 property 5: idempotent by id). The lexical
    /// write is the one that must succeed for the call to be considered a
    /// success; the vector write is attempted afterwards and its failure
    /// only degrades the document to "indexed lexical only" (spec §4.10
    /// state machine), recorded in the reconciliation log.
    pub async fn add(&self, input: DocumentInput) -> Result<String> {
        let id = input.id.clone().unwrap_or_else(|| stable_id(&input.text));

        self.lexical
            .upsert(&id, &input.text, &input.keywords, 0)?;

        match self.embed_with_retry(&input.text).await {
            Ok(embedding) => {
                if let Err(e) = self.vector.upsert(&id, embedding) {
                    warn!(doc_id = %id, error = %e, "vector write failed after lexical succeeded");
                    self.reconciliation
                        .record(&id, FailedLeg::Vector, e.to_string());
                }
            }
            Err(e) => {
                warn!(doc_id = %id, error = %e, "embedding failed, indexing lexical only");
                self.reconciliation
                    .record(&id, FailedLeg::Vector, format!("embedding failed: {e}"));
            }
        }

        Ok(id)
    }

    /// Batch-embed and write. Never aborts the whole batch on a single bad
    /// document (spec §4.4).
    pub async fn bulk_add(&self, items: Vec<DocumentInput>) -> BulkAddResult {
        let mut result = BulkAddResult::default();

        let ids: Vec<String> = items
            .iter()
            .map(|i| i.id.clone().unwrap_or_else(|| stable_id(&i.text)))
            .collect();

        // Lexical writes first, individually, so a single empty-text
        // document doesn't block the rest of the batch.
        let mut lexical_ok = vec![false; items.len()];
        for (idx, item) in items.iter().enumerate() {
            match self.lexical.upsert(&ids[idx], &item.text, &item.keywords, 0) {
                Ok(()) => lexical_ok[idx] = true,
                Err(e) => {
                    result.error_count += 1;
                    result.per_id_errors.push((ids[idx].clone(), e.to_string()));
                }
            }
        }

        let embeddable: Vec<String> = items
            .iter()
            .enumerate()
            .filter(|(idx, _)| lexical_ok[*idx])
            .map(|(_, item)| item.text.clone())
            .collect();

        let embeddings = if embeddable.is_empty() {
            Vec::new()
        } else {
            self.embedder.embed_batch(&embeddable).await.unwrap_or_default()
        };

        let mut embed_iter = embeddings.into_iter();
        for (idx, ok) in lexical_ok.iter().enumerate() {
            if !ok {
                continue;
            }
            result.success_count += 1;
            result.ids.push(ids[idx].clone());
            match embed_iter.next() {
                Some(vec) if !vec.is_empty() => {
                    if let Err(e) = self.vector.upsert(&ids[idx], vec) {
                        self.reconciliation
                            .record(&ids[idx], FailedLeg::Vector, e.to_string());
                    }
                }
                _ => {
                    self.reconciliation.record(
                        &ids[idx],
                        FailedLeg::Vector,
                        "embedding unavailable for this item",
                    );
                }
            }
        }

        result
    }

    /// Updates the frequency counter stored with the lexical document
    /// (spec §4.4).
    pub fn increment_frequency(&self, id: &str, delta: u64) {
        self.lexical.increment_frequency(id, delta);
    }

    pub fn find_id_by_text(&self, text: &str) -> Option<String> {
        self.lexical.find_by_text(text).into_iter().next()
    }

    /// Retries the embedding call once on failure (spec §7 item 6: "For
    /// writes, retry once; on repeated failure, index lexical only").
    async fn embed_with_retry(&self, text: &str) -> Result<Vec<f32>> {
        match self.embedder.embed(text).await {
            Ok(v) => Ok(v),
            Err(_) => self.embedder.embed(text).await,
        }
    }
}

pub type SharedDocumentStore = Arc<DocumentStore>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;
    use crate::lexical::{LexicalIndex, LexicalWeights};
    use crate::vector::VectorIndex;

    fn make_store() -> DocumentStore {
        let lexical = Arc::new(LexicalIndex::new(LexicalWeights::default()));
        let vector = Arc::new(VectorIndex::new(16));
        let embedder = Arc::new(EmbeddingProvider::new(Arc::new(HashingEmbedder::new(16)), 100, 512));
        let reconciliation = Arc::new(ReconciliationLog::default());
        DocumentStore::new(lexical, vector, embedder, reconciliation)
    }

    #[tokio::test]
    async fn add_is_idempotent_by_id() {
        let store = make_store();
        let input = DocumentInput {
            id: Some("doc1".to_string()),
            text: "销售额".to_string(),
            ..Default::default()
        };
        let id1 = store.add(input.clone()).await.unwrap();
        let id2 = store.add(input).await.unwrap();
        assert_eq!(id1, id2);
        assert_eq!(store.lexical.len(), 1);
        assert_eq!(store.vector.len(), 1);
    }

    #[tokio::test]
    async fn add_without_id_derives_stable_id() {
        let store = make_store();
        let id1 = store.add(DocumentInput::new("销售额")).await.unwrap();
        let id2 = store.add(DocumentInput::new("销售额")).await.unwrap();
        assert_eq!(id1, id2);
    }

    #[tokio::test]
    async fn bulk_add_reports_partial_failure() {
        let store = make_store();
        let items = vec![
            DocumentInput::new("销售额"),
            DocumentInput::new(""),
            DocumentInput::new("市场趋势"),
        ];
        let result = store.bulk_add(items).await;
        assert_eq!(result.success_count, 2);
        assert_eq!(result.error_count, 1);
    }

    #[tokio::test]
    async fn increment_frequency_is_visible_through_lexical_index() {
        let store = make_store();
        let id = store.add(DocumentInput::new("销售额")).await.unwrap();
        store.increment_frequency(&id, 5);
        assert_eq!(store.lexical.get_frequency(&id), Some(5));
    }
}
