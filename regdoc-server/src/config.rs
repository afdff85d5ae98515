//! Environment-variable configuration loader (§6).
//!
//! Every setting has a documented default so the server is runnable with no
//! environment at all except the three upstream model endpoints.

use std::env;
use std::path::PathBuf;

use regdoc_chunkstore::{ChunkStoreConfig, ChunkingConfig, RetrievalConfig};

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    var(name).and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Transport settings for one upstream model endpoint.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

/// Generation parameters for the answer composer and query planner (§4.8, §4.10).
#[derive(Debug, Clone, Copy)]
pub struct GenerationConfig {
    pub temperature_answer: f32,
    pub temperature_expand: f32,
    pub max_tokens: u32,
    pub input_price_per_1m: f32,
    pub output_price_per_1m: f32,
}

/// Citation validation settings (§4.10).
#[derive(Debug, Clone, Copy)]
pub struct CitationConfig {
    pub fuzzy_accept: f32,
    pub strict_citations: bool,
}

/// Upload policy (§6).
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_upload_mb: u64,
    pub allowed_extensions: Vec<String>,
}

impl UploadConfig {
    #[must_use]
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb * 1024 * 1024
    }

    #[must_use]
    pub fn extension_allowed(&self, filename: &str) -> bool {
        let ext = filename.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
        self.allowed_extensions.iter().any(|a| a.eq_ignore_ascii_case(&ext))
    }
}

/// Top-level server configuration, assembled once at process start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: String,
    pub storage_path: PathBuf,
    pub embedding: UpstreamConfig,
    pub reranker: UpstreamConfig,
    pub llm: UpstreamConfig,
    pub chunk_store: ChunkStoreConfig,
    pub generation: GenerationConfig,
    pub citation: CitationConfig,
    pub upload: UploadConfig,
}

impl AppConfig {
    /// Loads configuration from the process environment, falling back to
    /// the documented defaults for anything unset.
    ///
    /// # Panics
    /// Panics if `VECTOR_DIM` is set but not a valid `usize`; an invalid
    /// dimension cannot be recovered from and the process should not start.
    #[must_use]
    pub fn from_env() -> Self {
        let storage_path = PathBuf::from(var("STORAGE_PATH").unwrap_or_else(|| "./storage".to_string()));
        let vector_dim: usize = parse_or("VECTOR_DIM", 1536);

        let redb_path = var("REDB_PATH").map_or_else(|| storage_path.join("chunks.redb"), PathBuf::from);

        let chunking = ChunkingConfig {
            chunk_size_tokens: parse_or("CHUNK_SIZE_TOKENS", 1200),
            chunk_overlap_tokens: parse_or("CHUNK_OVERLAP_TOKENS", 300),
            chunk_min_tokens: parse_or("CHUNK_MIN_TOKENS", 50),
            ..ChunkingConfig::default()
        };

        let retrieval = RetrievalConfig {
            initial_top_k: parse_or("INITIAL_TOP_K", 50),
            top_k_results: parse_or("TOP_K_RESULTS", 10),
            max_per_doc: parse_or("MAX_PER_DOC", 3),
            enforce_diversity: parse_or("ENFORCE_DIVERSITY", true),
            rerank_threshold: parse_or("RERANK_THRESHOLD", 0.05),
            ..RetrievalConfig::default()
        };

        Self {
            listen_addr: var("LISTEN_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            embedding: UpstreamConfig {
                base_url: var("EMBEDDING_BASE_URL").unwrap_or_else(|| "http://localhost:11434/v1".to_string()),
                api_key: var("EMBEDDING_API_KEY").unwrap_or_default(),
                model: var("EMBEDDING_MODEL").unwrap_or_else(|| "text-embedding-3-small".to_string()),
            },
            reranker: UpstreamConfig {
                base_url: var("RERANKER_BASE_URL").unwrap_or_else(|| "http://localhost:11435".to_string()),
                api_key: var("RERANKER_API_KEY").unwrap_or_default(),
                model: var("RERANKER_MODEL").unwrap_or_else(|| "rerank-v1".to_string()),
            },
            llm: UpstreamConfig {
                base_url: var("LLM_BASE_URL").unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
                api_key: var("LLM_API_KEY").unwrap_or_default(),
                model: var("LLM_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            },
            chunk_store: ChunkStoreConfig {
                db_path: redb_path,
                vector_dim,
                chunking,
                retrieval,
            },
            generation: GenerationConfig {
                temperature_answer: parse_or("LLM_TEMPERATURE_ANSWER", 0.2),
                temperature_expand: parse_or("LLM_TEMPERATURE_EXPAND", 0.7),
                max_tokens: parse_or("LLM_MAX_TOKENS", 1200),
                input_price_per_1m: parse_or("LLM_INPUT_PRICE_PER_1M", 0.15),
                output_price_per_1m: parse_or("LLM_OUTPUT_PRICE_PER_1M", 0.60),
            },
            citation: CitationConfig {
                fuzzy_accept: parse_or("FUZZY_ACCEPT", 0.90),
                strict_citations: parse_or("STRICT_CITATIONS", false),
            },
            upload: UploadConfig {
                max_upload_mb: parse_or("MAX_UPLOAD_MB", 50),
                allowed_extensions: var("ALLOWED_EXTENSIONS")
                    .map(|v| v.split(',').map(|s| s.trim().to_ascii_lowercase()).collect())
                    .unwrap_or_else(|| vec!["pdf".to_string(), "docx".to_string(), "txt".to_string()]),
            },
            storage_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_config_checks_extension_case_insensitively() {
        let upload = UploadConfig {
            max_upload_mb: 50,
            allowed_extensions: vec!["pdf".to_string(), "docx".to_string()],
        };
        assert!(upload.extension_allowed("Report.PDF"));
        assert!(!upload.extension_allowed("archive.zip"));
        assert_eq!(upload.max_upload_bytes(), 50 * 1024 * 1024);
    }
}
