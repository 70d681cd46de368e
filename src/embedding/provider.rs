//! [`EmbeddingProvider`] (component C1): batches, caches, and truncates
//! around a pluggable [`Embedder`].

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

use super::embedder::Embedder;
use crate::error::Result;
use crate::util::tokenize::tokenize;

/// Truncate `text` to at most `max_chars` Unicode scalar values, cutting at
/// the nearest token boundary produced by [`tokenize`] rather than
/// mid-token, per spec §4.1: "longer inputs truncated with a stable policy
/// (right-truncate after tokenization boundary)".
pub fn truncate_stable(text: &str, max_chars: usize) -> &str {
    if text.chars().count() <= max_chars {
        return text;
    }
    let max_byte_len = text
        .char_indices()
        .nth(max_chars)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());

    let tokens = tokenize(text);
    let mut cut = 0;
    for tok in &tokens {
        if tok.end > max_byte_len {
            break;
        }
        cut = tok.end;
    }
    &text[..cut]
}

pub struct EmbeddingProvider {
    embedder: Arc<dyn Embedder>,
    cache: Mutex<LruCache<String, Vec<f32>>>,
    max_input_chars: usize,
}

impl EmbeddingProvider {
    pub fn new(embedder: Arc<dyn Embedder>, cache_size: usize, max_input_chars: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_size.max(1)).unwrap();
        Self {
            embedder,
            cache: Mutex::new(LruCache::new(capacity)),
            max_input_chars,
        }
    }

    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    /// Embed a single text. Wrapped as a batch-of-one per spec §4.1.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut out = self.embed_batch(std::slice::from_ref(&text.to_string())).await?;
        Ok(out.pop().unwrap_or_default())
    }

    /// Batch-embed, serving cache hits directly and only invoking the
    /// underlying encoder for misses.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let truncated: Vec<String> = texts
            .iter()
            .map(|t| truncate_stable(t, self.max_input_chars).to_string())
            .collect();

        let mut results: Vec<Option<Vec<f32>>> = vec![None; truncated.len()];
        let mut miss_indices = Vec::new();
        let mut miss_texts = Vec::new();

        {
            let mut cache = self.cache.lock();
            for (i, text) in truncated.iter().enumerate() {
                if let Some(v) = cache.get(text) {
                    results[i] = Some(v.clone());
                } else {
                    miss_indices.push(i);
                    miss_texts.push(text.clone());
                }
            }
        }

        if !miss_texts.is_empty() {
            let embedded = self.embedder.embed_batch(&miss_texts).await?;
            let mut cache = self.cache.lock();
            for (idx, vector) in miss_indices.into_iter().zip(embedded.into_iter()) {
                cache.put(truncated[idx].clone(), vector.clone());
                results[idx] = Some(vector);
            }
        }

        Ok(results.into_iter().map(|v| v.unwrap_or_default()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::hashing::HashingEmbedder;

    #[test]
    fn truncates_at_token_boundary() {
        let text = "销售额趋势分析报告今年总结";
        let truncated = truncate_stable(text, 4);
        assert!(truncated.chars().count() <= 4);
        assert_eq!(truncated, "销售额趋");
    }

    #[test]
    fn leaves_short_text_untouched() {
        assert_eq!(truncate_stable("hello", 512), "hello");
    }

    #[tokio::test]
    async fn cache_hit_returns_identical_vector_without_recompute() {
        let provider = EmbeddingProvider::new(Arc::new(HashingEmbedder::new(16)), 10, 512);
        let a = provider.embed("销售额").await.unwrap();
        let b = provider.embed("销售额").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn batch_preserves_order() {
        let provider = EmbeddingProvider::new(Arc::new(HashingEmbedder::new(16)), 10, 512);
        let texts = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        let out = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(out[0], out[2]);
        assert_ne!(out[0], out[1]);
    }
}
