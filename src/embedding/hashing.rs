//! Deterministic default [`Embedder`]: feature-hashes tokens into a
//! fixed-width vector and L2-normalizes it.
//!
//! This plays the role the teacher's `PrecomputedEmbedder` plays for tests
//! and examples that don't want a real model dependency — except here it is
//! also a legitimate small-scale production default, since spec §4.1 only
//! requires "identical input -> identical output" and a unit-length result,
//! not any particular semantic quality. Swapping in a real transformer
//! encoder (local or remote) only requires implementing [`Embedder`].

use ahash::AHasher;
use async_trait::async_trait;
use std::hash::{Hash, Hasher};

use super::embedder::Embedder;
use crate::error::Result;
use crate::util::tokenize::{normalize_token, tokenize};

pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dimension];
        for token in tokenize(text) {
            let normalized = normalize_token(&token.text);
            if normalized.is_empty() {
                continue;
            }
            // Hash each n-gram-less token into a bucket, with a sign derived
            // from a second hash (standard feature-hashing trick) to keep the
            // expected value of unrelated dimensions near zero.
            let mut h1 = AHasher::default();
            normalized.hash(&mut h1);
            let bucket = (h1.finish() as usize) % self.dimension;

            let mut h2 = AHasher::default();
            (normalized.as_str(), "sign").hash(&mut h2);
            let sign = if h2.finish() % 2 == 0 { 1.0 } else { -1.0 };

            v[bucket] += sign;
        }
        normalize(&mut v);
        v
    }
}

pub fn normalize(v: &mut [f32]) {
    let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    } else if !v.is_empty() {
        // Zero vector (empty/punctuation-only input): fall back to a fixed
        // unit vector along the first axis so the norm invariant still holds.
        v[0] = 1.0;
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}
