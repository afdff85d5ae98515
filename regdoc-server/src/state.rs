//! Process-wide shared state: the chunk store and the three model gateways,
//! each a singleton loaded once before the server accepts requests (§9).

use std::sync::Arc;

use regdoc_chunkstore::ChunkStore;
use regdoc_gateways::{EmbeddingGateway, LlmGateway, RerankerGateway};

use crate::config::AppConfig;
use crate::error::ApiError;

/// Shared application state, cheap to clone (an `Arc` around everything).
#[derive(Clone, Debug)]
pub struct AppState(Arc<Inner>);

#[derive(Debug)]
struct Inner {
    config: AppConfig,
    store: ChunkStore,
    embedder: EmbeddingGateway,
    reranker: RerankerGateway,
    llm: LlmGateway,
}

impl AppState {
    /// Builds the shared state: opens the chunk store and constructs the
    /// three gateways from `config`.
    ///
    /// # Errors
    /// Returns an error if the chunk store's backing database cannot be
    /// opened.
    pub fn init(config: AppConfig) -> Result<Self, ApiError> {
        std::fs::create_dir_all(&config.storage_path)?;
        let store = ChunkStore::open(&config.chunk_store).map_err(ApiError::from)?;

        let embedder = EmbeddingGateway::new(
            config.embedding.base_url.clone(),
            config.embedding.api_key.clone(),
            config.embedding.model.clone(),
            config.chunk_store.vector_dim,
        );
        let reranker = RerankerGateway::new(config.reranker.base_url.clone(), config.reranker.api_key.clone(), config.reranker.model.clone());
        let llm = LlmGateway::new(config.llm.base_url.clone(), config.llm.api_key.clone(), config.llm.model.clone());

        Ok(Self(Arc::new(Inner {
            config,
            store,
            embedder,
            reranker,
            llm,
        })))
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.0.config
    }

    #[must_use]
    pub fn store(&self) -> &ChunkStore {
        &self.0.store
    }

    #[must_use]
    pub fn embedder(&self) -> &EmbeddingGateway {
        &self.0.embedder
    }

    #[must_use]
    pub fn reranker(&self) -> &RerankerGateway {
        &self.0.reranker
    }

    #[must_use]
    pub fn llm(&self) -> &LlmGateway {
        &self.0.llm
    }
}
