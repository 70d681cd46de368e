//! C3 — VectorIndex (spec §4.3): a brute-force cosine-similarity store over
//! unit vectors. The teacher's `InMemoryVectorField` (vector/store/memory.rs)
//! scans a snapshot and scores every candidate per query; this index does
//! the same, trading an ANN structure for determinism, which the spec
//! requires ("must be deterministic given the same insertion order").

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::{QaError, Result};

#[derive(Debug, Clone)]
struct VectorEntry {
    id: String,
    vector: Vec<f32>,
    insertion_order: u64,
}

/// A single vector search result.
#[derive(Debug, Clone)]
pub struct VectorHit {
    pub id: String,
    pub similarity: f32,
}

pub struct VectorIndex {
    dimension: usize,
    entries: RwLock<HashMap<String, VectorEntry>>,
    next_order: std::sync::atomic::AtomicU64,
}

impl VectorIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            entries: RwLock::new(HashMap::new()),
            next_order: std::sync::atomic::AtomicU64::new(0),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Insert or replace the vector for `id`. Replacing keeps the original
    /// insertion order so tie-breaks stay stable across updates.
    pub fn upsert(&self, id: &str, vector: Vec<f32>) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(QaError::invalid_argument(format!(
                "vector dimension mismatch: expected {}, got {}",
                self.dimension,
                vector.len()
            )));
        }

        let mut entries = self.entries.write();
        let insertion_order = entries
            .get(id)
            .map(|e| e.insertion_order)
            .unwrap_or_else(|| self.next_order.fetch_add(1, std::sync::atomic::Ordering::Relaxed));

        entries.insert(
            id.to_string(),
            VectorEntry {
                id: id.to_string(),
                vector,
                insertion_order,
            },
        );
        Ok(())
    }

    pub fn remove(&self, id: &str) {
        self.entries.write().remove(id);
    }

    /// Top-`k` nearest neighbours by cosine similarity, descending. Ties
    /// break by insertion order then id, so repeated runs over the same
    /// state are bit-identical.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<VectorHit>> {
        if query.len() != self.dimension {
            return Err(QaError::invalid_argument(format!(
                "query vector dimension mismatch: expected {}, got {}",
                self.dimension,
                query.len()
            )));
        }

        let entries = self.entries.read();
        let mut scored: Vec<(f32, u64, VectorHit)> = entries
            .values()
            .map(|e| {
                let sim = cosine_similarity(query, &e.vector);
                (
                    sim,
                    e.insertion_order,
                    VectorHit {
                        id: e.id.clone(),
                        similarity: sim,
                    },
                )
            })
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.cmp(&b.1))
                .then_with(|| a.2.id.cmp(&b.2.id))
        });
        scored.truncate(k);
        Ok(scored.into_iter().map(|(_, _, hit)| hit).collect())
    }
}

/// Cosine similarity, clamped to `[-1, 1]` to absorb float rounding on
/// near-unit vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

pub type SharedVectorIndex = std::sync::Arc<VectorIndex>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_have_similarity_one() {
        let idx = VectorIndex::new(3);
        idx.upsert("a", vec![1.0, 0.0, 0.0]).unwrap();
        let hits = idx.search(&[1.0, 0.0, 0.0], 1).unwrap();
        assert_eq!(hits.len(), 1);
        assert!((hits[0].similarity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_have_similarity_zero() {
        let idx = VectorIndex::new(2);
        idx.upsert("a", vec![1.0, 0.0]).unwrap();
        let hits = idx.search(&[0.0, 1.0], 1).unwrap();
        assert!(hits[0].similarity.abs() < 1e-6);
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let idx = VectorIndex::new(3);
        let err = idx.upsert("a", vec![1.0, 0.0]).unwrap_err();
        assert!(matches!(err, QaError::InvalidArgument(_)));
    }

    #[test]
    fn ties_break_by_insertion_order_then_id() {
        let idx = VectorIndex::new(2);
        idx.upsert("b", vec![1.0, 0.0]).unwrap();
        idx.upsert("a", vec![1.0, 0.0]).unwrap();
        let hits = idx.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(hits[0].id, "b");
        assert_eq!(hits[1].id, "a");
    }

    #[test]
    fn search_is_deterministic_across_repeated_calls() {
        let idx = VectorIndex::new(4);
        idx.upsert("x", vec![0.5, 0.5, 0.5, 0.5]).unwrap();
        idx.upsert("y", vec![0.1, 0.2, 0.3, 0.4]).unwrap();
        let first = idx.search(&[1.0, 0.0, 0.0, 0.0], 2).unwrap();
        let second = idx.search(&[1.0, 0.0, 0.0, 0.0], 2).unwrap();
        let first_ids: Vec<&str> = first.iter().map(|h| h.id.as_str()).collect();
        let second_ids: Vec<&str> = second.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(first_ids, second_ids);
    }
}
