//! Persistence backend for the chunk store (§4.6).

mod redb_backend;

pub use redb_backend::RedbPersistence;

use std::path::Path;

use uuid::Uuid;

use crate::error::Result;
use crate::types::IndexEntry;

/// Durable storage for ANN index entries (chunk + embedding).
pub trait Persistence: Send + Sync {
    /// Upserts `entries`, keyed by chunk id.
    fn save(&self, entries: &[IndexEntry]) -> Result<()>;

    /// Loads every persisted entry; empty if none exist yet.
    fn load(&self) -> Result<Vec<IndexEntry>>;

    /// Removes a single entry by chunk id. Returns `true` if one was present.
    fn delete(&self, chunk_id: Uuid) -> Result<bool>;

    /// File extension conventionally used by this backend.
    fn extension(&self) -> &'static str;

    /// Path of the backing store.
    fn path(&self) -> &Path;
}
