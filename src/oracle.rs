//! C9 — OracleClient (spec §4.9): an optional, narrow interface to an
//! external semantic service. The engine is fully specified to work
//! without one; [`NullOracle`] is the default capability, mirroring the
//! teacher's pattern of keeping an LLM/remote backend behind a trait so the
//! default build never depends on it (`embeddings-openai` feature).

use async_trait::async_trait;

use crate::error::Result;

/// A ranked prefix-tail completion candidate (spec §4.9:
/// `rank_prefix_completions(...) -> list[{text, score}]`).
#[derive(Debug, Clone)]
pub struct RankedCompletion {
    pub text: String,
    pub score: f32,
}

/// Optional capability set for semantic expansion, related-query
/// generation, and prefix-tail ranking. Any call that times out, errors, or
/// returns an unparseable response MUST be treated as empty by the caller,
/// never fatal (spec §4.9) — callers enforce the timeout, this trait only
/// needs to report availability.
#[async_trait]
pub trait OracleClient: Send + Sync {
    async fn expand_query(&self, query: &str, max: usize) -> Result<Vec<String>>;
    async fn generate_related(&self, query: &str, context: Option<&str>, max: usize) -> Result<Vec<String>>;
    async fn rank_prefix_completions(
        &self,
        prefix: &str,
        tail: &str,
        candidates: &[String],
        context: Option<&str>,
    ) -> Result<Vec<RankedCompletion>>;
    fn is_available(&self) -> bool;
}

/// The default, always-absent oracle. Every call returns empty; the engine
/// must behave identically to "oracle down" (spec §4.9, §9: "the engine is
/// specified to work fully without it").
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOracle;

#[async_trait]
impl OracleClient for NullOracle {
    async fn expand_query(&self, _query: &str, _max: usize) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn generate_related(&self, _query: &str, _context: Option<&str>, _max: usize) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn rank_prefix_completions(
        &self,
        _prefix: &str,
        _tail: &str,
        _candidates: &[String],
        _context: Option<&str>,
    ) -> Result<Vec<RankedCompletion>> {
        Ok(Vec::new())
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// HTTP-backed oracle for deployments with a real semantic backend, gated
/// behind `oracle-http` so the default build never links `reqwest` (same
/// rationale as [`crate::embedding::remote::RemoteEmbedder`]).
#[cfg(feature = "oracle-http")]
pub mod remote {
    use std::time::Duration;

    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};

    use super::{OracleClient, RankedCompletion};
    use crate::error::{QaError, Result};

    pub struct RemoteOracle {
        client: reqwest::Client,
        endpoint: String,
        model: String,
        temperature: f32,
        max_tokens: u32,
        timeout: Duration,
    }

    impl RemoteOracle {
        pub fn new(
            endpoint: impl Into<String>,
            model: impl Into<String>,
            temperature: f32,
            max_tokens: u32,
            timeout: Duration,
        ) -> Self {
            Self {
                client: reqwest::Client::new(),
                endpoint: endpoint.into(),
                model: model.into(),
                temperature,
                max_tokens,
                timeout,
            }
        }

        async fn post<Req: Serialize, Resp: for<'de> Deserialize<'de>>(&self, path: &str, body: &Req) -> Result<Resp> {
            let url = format!("{}/{}", self.endpoint.trim_end_matches('/'), path);
            let resp = tokio::time::timeout(self.timeout, self.client.post(&url).json(body).send())
                .await
                .map_err(|_| QaError::Timeout(self.timeout))?
                .map_err(|e| QaError::Unavailable(format!("oracle endpoint error: {e}")))?;
            resp.json::<Resp>()
                .await
                .map_err(|e| QaError::Internal(format!("unparseable oracle response: {e}")))
        }
    }

    #[derive(Serialize)]
    struct ExpandRequest<'a> {
        model: &'a str,
        query: &'a str,
        max: usize,
        temperature: f32,
        max_tokens: u32,
    }

    #[derive(Deserialize)]
    struct ListResponse {
        items: Vec<String>,
    }

    #[derive(Serialize)]
    struct RelatedRequest<'a> {
        model: &'a str,
        query: &'a str,
        context: Option<&'a str>,
        max: usize,
    }

    #[derive(Serialize)]
    struct RankRequest<'a> {
        model: &'a str,
        prefix: &'a str,
        tail: &'a str,
        candidates: &'a [String],
        context: Option<&'a str>,
    }

    #[derive(Deserialize)]
    struct RankResponseItem {
        text: String,
        score: f32,
    }

    #[derive(Deserialize)]
    struct RankResponse {
        items: Vec<RankResponseItem>,
    }

    #[async_trait]
    impl OracleClient for RemoteOracle {
        async fn expand_query(&self, query: &str, max: usize) -> Result<Vec<String>> {
            let body = ExpandRequest {
                model: &self.model,
                query,
                max,
                temperature: self.temperature,
                max_tokens: self.max_tokens,
            };
            let resp: ListResponse = self.post("expand", &body).await?;
            Ok(resp.items)
        }

        async fn generate_related(&self, query: &str, context: Option<&str>, max: usize) -> Result<Vec<String>> {
            let body = RelatedRequest {
                model: &self.model,
                query,
                context,
                max,
            };
            let resp: ListResponse = self.post("related", &body).await?;
            Ok(resp.items)
        }

        async fn rank_prefix_completions(
            &self,
            prefix: &str,
            tail: &str,
            candidates: &[String],
            context: Option<&str>,
        ) -> Result<Vec<RankedCompletion>> {
            let body = RankRequest {
                model: &self.model,
                prefix,
                tail,
                candidates,
                context,
            };
            let resp: RankResponse = self.post("rank-prefix", &body).await?;
            Ok(resp
                .items
                .into_iter()
                .map(|i| RankedCompletion { text: i.text, score: i.score })
                .collect())
        }

        fn is_available(&self) -> bool {
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_oracle_reports_unavailable_and_empty() {
        let oracle = NullOracle;
        assert!(!oracle.is_available());
        assert!(oracle.expand_query("q", 3).await.unwrap().is_empty());
        assert!(oracle.generate_related("q", None, 5).await.unwrap().is_empty());
        assert!(oracle
            .rank_prefix_completions("pre", "tail", &["a".to_string()], None)
            .await
            .unwrap()
            .is_empty());
    }
}
