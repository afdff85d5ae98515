//! Vector index abstraction for the chunk store (component C6, §4.6).

mod hnsw;

pub use hnsw::HnswIndex;

use uuid::Uuid;

use crate::error::Result;
use crate::types::{Chunk, IndexEntry, ScoredChunk};

/// An approximate nearest-neighbor index over chunk embeddings.
pub trait VectorIndex: Send + Sync {
    /// Inserts or replaces a chunk, keyed by its own id.
    fn insert(&self, chunk: Chunk) -> Result<()>;

    /// Removes a chunk by id. Returns `true` if one was present.
    fn remove(&self, chunk_id: Uuid) -> bool;

    /// Returns the `top_k` nearest chunks to `query` with similarity at or
    /// above `threshold`, ordered by descending similarity.
    fn search(&self, query: &[f32], top_k: usize, threshold: f32) -> Result<Vec<ScoredChunk>>;

    /// The fixed embedding dimension `D` this index was built for.
    fn dimension(&self) -> usize;

    /// Number of indexed chunks.
    fn len(&self) -> usize;

    /// True iff the index holds no chunks.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops all entries.
    fn clear(&self);

    /// Snapshots every entry, for persistence.
    fn entries(&self) -> Vec<IndexEntry>;

    /// Replaces the index's contents with `entries`, e.g. on startup load.
    fn load(&self, entries: Vec<IndexEntry>) -> Result<()>;

    /// True iff a chunk with this content hash is already indexed (§4.6
    /// dedup policy).
    fn contains_hash(&self, hash: u64) -> bool;
}
