//! Chunk store (component C6, §4.6): the persisted document/chunk model
//! plus ANN search, composed from [`HnswIndex`] and [`RedbPersistence`].

use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use crate::config::ChunkStoreConfig;
use crate::error::{ChunkStoreError, Result};
use crate::index::{HnswIndex, VectorIndex};
use crate::persistence::{Persistence, RedbPersistence};
use crate::types::{Chunk, Document, ScoredChunk};

/// The persisted chunk store: documents, chunks, and their ANN index.
///
/// Ingestion of a document (`ingest`) and deletion (`delete_document`) are
/// each internally atomic with respect to the in-memory index, and durable
/// via `redb` before the call returns (§3 invariant: a document is either
/// fully present or not present at all).
#[derive(Debug)]
pub struct ChunkStore {
    index: HnswIndex,
    persistence: RedbPersistence,
    documents: RwLock<HashMap<Uuid, Document>>,
}

impl ChunkStore {
    /// Opens (or creates) the store at `config.db_path`, loading any
    /// previously persisted documents and chunks into memory.
    ///
    /// # Errors
    /// Returns an error if the backing database cannot be opened, or if a
    /// persisted embedding does not match `config.vector_dim`.
    pub fn open(config: &ChunkStoreConfig) -> Result<Self> {
        let persistence = RedbPersistence::new(&config.db_path)?;
        let index = HnswIndex::new(config.vector_dim);
        index.load(persistence.load()?)?;

        let documents = persistence
            .load_documents()?
            .into_iter()
            .map(|d| (d.id, d))
            .collect::<HashMap<_, _>>();

        Ok(Self {
            index,
            persistence,
            documents: RwLock::new(documents),
        })
    }

    /// Persists a document and its chunks together. Any chunk whose
    /// embedding dimension does not match the store's configured dimension
    /// aborts the whole call before anything is written.
    ///
    /// # Errors
    /// Returns [`ChunkStoreError::DimensionMismatch`] or a storage error.
    pub fn ingest(&self, document: Document, chunks: Vec<Chunk>) -> Result<()> {
        for chunk in &chunks {
            if chunk.embedding.len() != self.index.dimension() {
                return Err(ChunkStoreError::DimensionMismatch {
                    expected: self.index.dimension(),
                    actual: chunk.embedding.len(),
                });
            }
        }

        let entries: Vec<_> = chunks.iter().cloned().map(crate::types::IndexEntry::new).collect();
        self.persistence.put_document_with_entries(&document, &entries)?;

        for chunk in chunks {
            self.index.insert(chunk)?;
        }
        self.documents.write().expect("chunk store lock poisoned").insert(document.id, document);
        Ok(())
    }

    /// Deletes a document and every chunk it owns. Returns `true` if the
    /// document existed.
    ///
    /// # Errors
    /// Returns an error if the persistence layer cannot commit the removal.
    pub fn delete_document(&self, document_id: Uuid) -> Result<bool> {
        let existed = self.documents.write().expect("chunk store lock poisoned").remove(&document_id).is_some();
        if !existed {
            return Ok(false);
        }

        let owned_chunk_ids: Vec<Uuid> = self
            .index
            .entries()
            .into_iter()
            .filter(|e| e.chunk.document_id == document_id)
            .map(|e| e.chunk.id)
            .collect();

        for chunk_id in owned_chunk_ids {
            self.index.remove(chunk_id);
            self.persistence.delete(chunk_id)?;
        }
        self.persistence.delete_document(document_id)?;

        Ok(true)
    }

    /// Fetches a document by id.
    #[must_use]
    pub fn get_document(&self, document_id: Uuid) -> Option<Document> {
        self.documents.read().expect("chunk store lock poisoned").get(&document_id).cloned()
    }

    /// Lists every document, in no particular order.
    #[must_use]
    pub fn list_documents(&self) -> Vec<Document> {
        self.documents.read().expect("chunk store lock poisoned").values().cloned().collect()
    }

    /// Number of documents currently stored.
    #[must_use]
    pub fn count_documents(&self) -> usize {
        self.documents.read().expect("chunk store lock poisoned").len()
    }

    /// Number of chunks currently indexed, across all documents.
    #[must_use]
    pub fn count_chunks(&self) -> usize {
        self.index.len()
    }

    /// Fetches a single chunk by id, used by the retriever to resolve
    /// metadata after ranking.
    #[must_use]
    pub fn get_chunk(&self, chunk_id: Uuid) -> Option<Chunk> {
        self.index.entries().into_iter().find(|e| e.chunk.id == chunk_id).map(|e| e.chunk)
    }

    /// Runs an ANN search over the index, returning up to `top_k` chunks
    /// with cosine similarity at or above `threshold`.
    ///
    /// # Errors
    /// Returns [`ChunkStoreError::DimensionMismatch`] if `query` does not
    /// match the store's configured embedding dimension.
    pub fn search(&self, query: &[f32], top_k: usize, threshold: f32) -> Result<Vec<ScoredChunk>> {
        self.index.search(query, top_k, threshold)
    }
}
