//! HTTP embedding gateway (component C3, §4.3): an OpenAI-compatible
//! embeddings endpoint behind bearer auth.

use regdoc_core::EmbeddingModel;
use serde::{Deserialize, Serialize};

use crate::error::EmbeddingError;
use crate::retry::with_retry;

const DEFAULT_BATCH_SIZE: usize = 32;
const MAX_ATTEMPTS: u32 = 3;

/// Embedding gateway backed by an OpenAI-compatible `/embeddings` endpoint.
#[derive(Debug, Clone)]
pub struct EmbeddingGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    dimension: usize,
    batch_size: usize,
}

impl EmbeddingGateway {
    /// Builds a gateway against `base_url` for `model`, whose embeddings
    /// are expected to have length `dimension`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>, dimension: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            dimension,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Overrides the sub-batch size used for oversized `embed_batch` calls.
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    async fn request_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        with_retry(MAX_ATTEMPTS, "embed", || async {
            let response = self
                .client
                .post(format!("{}/embeddings", self.base_url.trim_end_matches('/')))
                .bearer_auth(&self.api_key)
                .json(&EmbeddingRequest {
                    model: &self.model,
                    input: texts,
                })
                .send()
                .await
                .map_err(|e| EmbeddingError::Unavailable(e.to_string()))?;

            if !response.status().is_success() {
                return Err(EmbeddingError::Unavailable(format!("status {}", response.status())));
            }

            let body: EmbeddingResponse =
                response.json().await.map_err(|e| EmbeddingError::MalformedResponse(e.to_string()))?;

            Ok(body.data.into_iter().map(|d| d.embedding).collect())
        })
        .await
    }
}

impl EmbeddingModel for EmbeddingGateway {
    fn dim(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> regdoc_core::Result<Vec<f32>> {
        let mut result = self.embed_batch(&[text]).await?;
        Ok(result.pop().unwrap_or_default())
    }

    async fn embed_batch(&self, texts: &[&str]) -> regdoc_core::Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for sub_batch in texts.chunks(self.batch_size.max(1)) {
            embeddings.extend(self.request_batch(sub_batch).await?);
        }
        Ok(embeddings)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_size_override_is_applied() {
        let gateway = EmbeddingGateway::new("http://localhost", "key", "model", 384).with_batch_size(8);
        assert_eq!(gateway.batch_size, 8);
        assert_eq!(gateway.dim(), 384);
    }
}
