//! HTTP reranker gateway (component C4, §4.4): a cross-encoder scoring
//! endpoint. Failure here never blocks retrieval (the retriever falls back
//! to ANN similarity and flags `degraded=true`).

use regdoc_core::Reranker;
use serde::{Deserialize, Serialize};

use crate::error::RerankerError;
use crate::retry::with_retry;

const MAX_ATTEMPTS: u32 = 3;

/// Reranker gateway backed by a `/rerank` cross-encoder endpoint.
#[derive(Debug, Clone)]
pub struct RerankerGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl RerankerGateway {
    /// Builds a gateway against `base_url` for `model`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

impl Reranker for RerankerGateway {
    async fn rerank(&self, query: &str, passages: &[&str]) -> regdoc_core::Result<Vec<f32>> {
        let scores = with_retry(MAX_ATTEMPTS, "rerank", || async {
            let response = self
                .client
                .post(format!("{}/rerank", self.base_url.trim_end_matches('/')))
                .bearer_auth(&self.api_key)
                .json(&RerankRequest {
                    model: &self.model,
                    query,
                    documents: passages,
                })
                .send()
                .await
                .map_err(|e| RerankerError::Unavailable(e.to_string()))?;

            if !response.status().is_success() {
                return Err(RerankerError::Unavailable(format!("status {}", response.status())));
            }

            let body: RerankResponse =
                response.json().await.map_err(|e| RerankerError::MalformedResponse(e.to_string()))?;

            let mut scores = vec![0.0f32; passages.len()];
            for result in body.results {
                if let Some(slot) = scores.get_mut(result.index) {
                    *slot = result.relevance_score;
                }
            }
            Ok(scores)
        })
        .await?;

        Ok(scores)
    }
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: &'a [&'a str],
}

#[derive(Deserialize)]
struct RerankResponse {
    results: Vec<RerankResult>,
}

#[derive(Deserialize)]
struct RerankResult {
    index: usize,
    relevance_score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_is_constructed_with_given_model() {
        let gateway = RerankerGateway::new("http://localhost", "key", "rerank-model");
        assert_eq!(gateway.model, "rerank-model");
    }
}
