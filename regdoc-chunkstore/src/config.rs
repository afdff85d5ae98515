//! Chunking, retrieval, and storage parameters (§4.2, §4.9, §6 env vars).
//!
//! Every field here has a matching environment variable owned by
//! `regdoc-server`'s config loader; this type only knows defaults and shape.

use std::path::PathBuf;

/// Parameters controlling the hierarchical chunker (`CHUNK_*` env vars).
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Target chunk size in tokens.
    pub chunk_size_tokens: u32,
    /// Trailing token slice replicated into the next chunk.
    pub chunk_overlap_tokens: u32,
    /// Chunks smaller than this after boundary cleanup are dropped.
    pub chunk_min_tokens: u32,
    /// Hard upper bound on `token_count`; never exceeded regardless of
    /// `chunk_size_tokens` (§3 invariant).
    pub chunk_size_hard_cap: u32,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size_tokens: 1200,
            chunk_overlap_tokens: 300,
            chunk_min_tokens: 50,
            chunk_size_hard_cap: 2000,
        }
    }
}

impl ChunkingConfig {
    /// Returns a copy with `chunk_size_tokens` bounded by `chunk_size_hard_cap`,
    /// so a deployer-supplied `CHUNK_SIZE_TOKENS` above the hard cap can never
    /// make the chunker target a size it isn't allowed to produce.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            chunk_size_tokens: self.chunk_size_tokens.min(self.chunk_size_hard_cap),
            ..self.clone()
        }
    }
}

/// Parameters controlling the retriever (§4.9).
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Candidate pool size pulled from the ANN index before reranking.
    pub initial_top_k: usize,
    /// Number of chunks returned after filtering and diversity selection.
    pub top_k_results: usize,
    /// Maximum chunks from a single document when diversity is enforced.
    pub max_per_doc: usize,
    /// Whether to run the two-pass diversity selection (§4.9 stage 4).
    pub enforce_diversity: bool,
    /// Minimum normalized rerank score to keep a candidate.
    pub rerank_threshold: f32,
    /// Minimum cosine similarity to keep a candidate in fallback (no
    /// reranker) mode; lives on a different scale than `rerank_threshold`
    /// and is never applied to normalized rerank scores (§9 design note).
    pub similarity_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            initial_top_k: 50,
            top_k_results: 10,
            max_per_doc: 3,
            enforce_diversity: true,
            rerank_threshold: 0.05,
            similarity_threshold: 0.0,
        }
    }
}

/// Top-level chunk-store configuration.
#[derive(Debug, Clone)]
pub struct ChunkStoreConfig {
    /// Path to the redb database file.
    pub db_path: PathBuf,
    /// Embedding dimension `D`; fixed for the lifetime of the store.
    pub vector_dim: usize,
    /// Chunker parameters.
    pub chunking: ChunkingConfig,
    /// Retriever parameters.
    pub retrieval: RetrievalConfig,
}

impl ChunkStoreConfig {
    /// Builds a configuration for the given vector dimension and db path,
    /// with every other parameter at its documented default.
    #[must_use]
    pub fn new(db_path: impl Into<PathBuf>, vector_dim: usize) -> Self {
        Self {
            db_path: db_path.into(),
            vector_dim,
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunking_defaults_match_spec() {
        let config = ChunkingConfig::default();
        assert_eq!(config.chunk_size_tokens, 1200);
        assert_eq!(config.chunk_overlap_tokens, 300);
        assert_eq!(config.chunk_min_tokens, 50);
    }

    #[test]
    fn retrieval_defaults_match_spec() {
        let config = RetrievalConfig::default();
        assert_eq!(config.max_per_doc, 3);
        assert!(config.enforce_diversity);
        assert!((config.rerank_threshold - 0.05).abs() < f32::EPSILON);
    }
}
