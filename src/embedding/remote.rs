//! Optional HTTP-backed [`Embedder`], mirroring the teacher's
//! `embeddings-openai` feature (an `OpenAIEmbedder` behind `reqwest`,
//! gated so the default build never pulls in a TLS stack).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::embedder::Embedder;
use crate::error::{QaError, Result};

pub struct RemoteEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dimension: usize,
    timeout: Duration,
}

impl RemoteEmbedder {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, dimension: usize, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
            dimension,
            timeout,
        }
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedItem>,
}

#[derive(Deserialize)]
struct EmbedItem {
    embedding: Vec<f32>,
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        let resp = tokio::time::timeout(
            self.timeout,
            self.client.post(&self.endpoint).json(&body).send(),
        )
        .await
        .map_err(|_| QaError::Timeout(self.timeout))?
        .map_err(|e| QaError::Unavailable(format!("embedding endpoint error: {e}")))?;

        let parsed: EmbedResponse = resp
            .json()
            .await
            .map_err(|e| QaError::Internal(format!("unparseable embedding response: {e}")))?;

        Ok(parsed.data.into_iter().map(|item| item.embedding).collect())
    }
}
