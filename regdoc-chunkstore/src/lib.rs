//! Chunking, persisted chunk store, and retrieval for the regulatory RAG
//! pipeline (components C2, C6, C9).
//!
//! - [`chunking`] splits one document's extracted text into overlapping,
//!   page- and section-annotated chunks.
//! - [`store`] persists documents and chunks, backed by an HNSW ANN index
//!   ([`index`]) and a `redb` embedded database ([`persistence`]).
//! - [`retriever`] runs ANN recall, cross-encoder reranking, thresholding,
//!   and per-document diversity selection over a [`store::ChunkStore`].

pub mod chunking;
pub mod config;
mod dedup;
pub mod error;
pub mod index;
pub mod persistence;
pub mod retriever;
mod store;
pub mod tokenizer;
pub mod types;

pub use chunking::{chunk, ChunkDraft};
pub use config::{ChunkStoreConfig, ChunkingConfig, RetrievalConfig};
pub use error::{ChunkStoreError, Result};
pub use index::{HnswIndex, VectorIndex};
pub use persistence::{Persistence, RedbPersistence};
pub use retriever::{retrieve, RetrievalOutcome, RetrievalTimings};
pub use store::ChunkStore;
pub use types::{Chunk, ChunkMetadata, Document, DocumentClass, DocumentMetadata, IndexEntry, ScoredChunk};
