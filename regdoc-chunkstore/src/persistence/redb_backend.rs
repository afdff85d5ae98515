//! redb-based embedded database persistence (§4.6).
//!
//! One table holds ANN index entries (chunk + embedding), a second holds
//! document records. [`RedbPersistence::put_document_with_entries`] writes
//! both inside a single `redb` transaction on ingest, so a crash never
//! leaves one table ahead of the other.

use std::fs;
use std::path::{Path, PathBuf};

use redb::{Database, ReadableTable, TableDefinition};
use uuid::Uuid;

use crate::error::{ChunkStoreError, Result};
use crate::types::{Document, IndexEntry};

use super::Persistence;

const ENTRIES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("entries");
const DOCUMENTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("documents");

/// Embedded-database persistence backend using `redb`.
pub struct RedbPersistence {
    path: PathBuf,
    db: Database,
}

impl std::fmt::Debug for RedbPersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbPersistence").field("path", &self.path).finish_non_exhaustive()
    }
}

impl RedbPersistence {
    /// Creates or opens the database at `path`, creating parent directories
    /// as needed.
    ///
    /// # Errors
    /// Returns an error if the database file cannot be created or opened.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let db = Database::create(&path).map_err(|e| ChunkStoreError::StorageUnavailable(e.to_string()))?;

        Ok(Self { path, db })
    }

    /// Upserts a document record and its chunk entries in one `redb`
    /// transaction, so a crash between the two tables is never observable:
    /// either both are durable or neither is (§3 invariant).
    ///
    /// # Errors
    /// Returns an error if the write transaction fails to commit.
    pub fn put_document_with_entries(&self, document: &Document, entries: &[IndexEntry]) -> Result<()> {
        let write_txn = self.db.begin_write().map_err(|e| ChunkStoreError::StorageUnavailable(e.to_string()))?;
        {
            let mut documents_table =
                write_txn.open_table(DOCUMENTS_TABLE).map_err(|e| ChunkStoreError::StorageUnavailable(e.to_string()))?;
            let serialized = serde_json::to_vec(document).map_err(|e| ChunkStoreError::Serialization(e.to_string()))?;
            documents_table
                .insert(document.id.to_string().as_str(), serialized.as_slice())
                .map_err(|e| ChunkStoreError::StorageUnavailable(e.to_string()))?;
        }
        {
            let mut entries_table =
                write_txn.open_table(ENTRIES_TABLE).map_err(|e| ChunkStoreError::StorageUnavailable(e.to_string()))?;
            for entry in entries {
                let serialized = serde_json::to_vec(entry).map_err(|e| ChunkStoreError::Serialization(e.to_string()))?;
                entries_table
                    .insert(entry.chunk.id.to_string().as_str(), serialized.as_slice())
                    .map_err(|e| ChunkStoreError::StorageUnavailable(e.to_string()))?;
            }
        }
        write_txn.commit().map_err(|e| ChunkStoreError::StorageUnavailable(e.to_string()))?;
        Ok(())
    }

    /// Loads every persisted document.
    ///
    /// # Errors
    /// Returns an error if the read transaction fails.
    pub fn load_documents(&self) -> Result<Vec<Document>> {
        let read_txn = self.db.begin_read().map_err(|e| ChunkStoreError::StorageUnavailable(e.to_string()))?;
        let table = match read_txn.open_table(DOCUMENTS_TABLE) {
            Ok(t) => t,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(ChunkStoreError::StorageUnavailable(e.to_string())),
        };

        let mut documents = Vec::new();
        for result in table.iter().map_err(|e| ChunkStoreError::StorageUnavailable(e.to_string()))? {
            let (_, value) = result.map_err(|e| ChunkStoreError::StorageUnavailable(e.to_string()))?;
            let document: Document =
                serde_json::from_slice(value.value()).map_err(|e| ChunkStoreError::Serialization(e.to_string()))?;
            documents.push(document);
        }
        Ok(documents)
    }

    /// Removes a document record by id. Returns `true` if one was present.
    ///
    /// # Errors
    /// Returns an error if the write transaction fails to commit.
    pub fn delete_document(&self, id: Uuid) -> Result<bool> {
        let write_txn = self.db.begin_write().map_err(|e| ChunkStoreError::StorageUnavailable(e.to_string()))?;
        let removed;
        {
            let mut table =
                write_txn.open_table(DOCUMENTS_TABLE).map_err(|e| ChunkStoreError::StorageUnavailable(e.to_string()))?;
            removed = table
                .remove(id.to_string().as_str())
                .map_err(|e| ChunkStoreError::StorageUnavailable(e.to_string()))?
                .is_some();
        }
        write_txn.commit().map_err(|e| ChunkStoreError::StorageUnavailable(e.to_string()))?;
        Ok(removed)
    }
}

impl Persistence for RedbPersistence {
    fn save(&self, entries: &[IndexEntry]) -> Result<()> {
        let write_txn = self.db.begin_write().map_err(|e| ChunkStoreError::StorageUnavailable(e.to_string()))?;

        {
            let mut table =
                write_txn.open_table(ENTRIES_TABLE).map_err(|e| ChunkStoreError::StorageUnavailable(e.to_string()))?;

            for entry in entries {
                let serialized = serde_json::to_vec(entry).map_err(|e| ChunkStoreError::Serialization(e.to_string()))?;
                table
                    .insert(entry.chunk.id.to_string().as_str(), serialized.as_slice())
                    .map_err(|e| ChunkStoreError::StorageUnavailable(e.to_string()))?;
            }
        }

        write_txn.commit().map_err(|e| ChunkStoreError::StorageUnavailable(e.to_string()))?;
        Ok(())
    }

    fn load(&self) -> Result<Vec<IndexEntry>> {
        let read_txn = self.db.begin_read().map_err(|e| ChunkStoreError::StorageUnavailable(e.to_string()))?;

        let table = match read_txn.open_table(ENTRIES_TABLE) {
            Ok(t) => t,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(ChunkStoreError::StorageUnavailable(e.to_string())),
        };

        let mut entries = Vec::new();
        for result in table.iter().map_err(|e| ChunkStoreError::StorageUnavailable(e.to_string()))? {
            let (_, value) = result.map_err(|e| ChunkStoreError::StorageUnavailable(e.to_string()))?;
            let entry: IndexEntry =
                serde_json::from_slice(value.value()).map_err(|e| ChunkStoreError::Serialization(e.to_string()))?;
            entries.push(entry);
        }

        Ok(entries)
    }

    fn delete(&self, chunk_id: Uuid) -> Result<bool> {
        let write_txn = self.db.begin_write().map_err(|e| ChunkStoreError::StorageUnavailable(e.to_string()))?;
        let removed;
        {
            let mut table =
                write_txn.open_table(ENTRIES_TABLE).map_err(|e| ChunkStoreError::StorageUnavailable(e.to_string()))?;
            removed = table
                .remove(chunk_id.to_string().as_str())
                .map_err(|e| ChunkStoreError::StorageUnavailable(e.to_string()))?
                .is_some();
        }
        write_txn.commit().map_err(|e| ChunkStoreError::StorageUnavailable(e.to_string()))?;
        Ok(removed)
    }

    fn extension(&self) -> &'static str {
        "redb"
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Chunk, ChunkMetadata, DocumentClass};
    use chrono::Utc;
    use tempfile::tempdir;

    fn make_entry(text: &str) -> IndexEntry {
        let chunk = Chunk {
            id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            chunk_index: 0,
            content: text.to_string(),
            token_count: 2,
            embedding: vec![1.0, 2.0, 3.0, 4.0],
            metadata: ChunkMetadata {
                document_name: "doc1".to_string(),
                ..Default::default()
            },
        };
        IndexEntry::new(chunk)
    }

    fn make_document() -> Document {
        Document {
            id: Uuid::new_v4(),
            filename: "regulation.pdf".to_string(),
            stored_path: PathBuf::from("/tmp/regulation.pdf"),
            byte_size: 1024,
            mime_kind: regdoc_extract::MimeKind::Pdf,
            document_class: DocumentClass::Regulation,
            uploaded_at: Utc::now(),
            metadata: std::collections::BTreeMap::new(),
        }
    }

    #[test]
    fn save_and_load_entries() {
        let dir = tempdir().unwrap();
        let persistence = RedbPersistence::new(dir.path().join("test.redb")).unwrap();

        let entries = vec![make_entry("hello"), make_entry("world")];
        persistence.save(&entries).unwrap();

        let loaded = persistence.load().unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn load_empty_db() {
        let dir = tempdir().unwrap();
        let persistence = RedbPersistence::new(dir.path().join("empty.redb")).unwrap();

        assert!(persistence.load().unwrap().is_empty());
        assert!(persistence.load_documents().unwrap().is_empty());
    }

    #[test]
    fn overwrite_entry_with_same_id() {
        let dir = tempdir().unwrap();
        let persistence = RedbPersistence::new(dir.path().join("test.redb")).unwrap();

        let mut entry = make_entry("hello");
        let id = entry.chunk.id;
        persistence.save(&[entry.clone()]).unwrap();

        entry.chunk.content = "world".to_string();
        persistence.save(&[entry]).unwrap();

        let loaded = persistence.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].chunk.id, id);
        assert_eq!(loaded[0].chunk.content, "world");
    }

    #[test]
    fn document_round_trip_and_delete() {
        let dir = tempdir().unwrap();
        let persistence = RedbPersistence::new(dir.path().join("test.redb")).unwrap();

        let document = make_document();
        let id = document.id;
        persistence.put_document_with_entries(&document, &[]).unwrap();

        let loaded = persistence.load_documents().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, id);

        assert!(persistence.delete_document(id).unwrap());
        assert!(persistence.load_documents().unwrap().is_empty());
        assert!(!persistence.delete_document(id).unwrap());
    }

    #[test]
    fn put_document_with_entries_persists_both_tables() {
        let dir = tempdir().unwrap();
        let persistence = RedbPersistence::new(dir.path().join("test.redb")).unwrap();

        let document = make_document();
        let document_id = document.id;
        let entry = make_entry("hello");
        persistence.put_document_with_entries(&document, std::slice::from_ref(&entry)).unwrap();

        assert_eq!(persistence.load_documents().unwrap().len(), 1);
        assert_eq!(persistence.load().unwrap().len(), 1);

        assert!(persistence.delete_document(document_id).unwrap());
        assert!(persistence.delete(entry.chunk.id).unwrap());
    }

    #[test]
    fn delete_entry() {
        let dir = tempdir().unwrap();
        let persistence = RedbPersistence::new(dir.path().join("test.redb")).unwrap();

        let entry = make_entry("hello");
        let id = entry.chunk.id;
        persistence.save(&[entry]).unwrap();

        assert!(persistence.delete(id).unwrap());
        assert!(persistence.load().unwrap().is_empty());
        assert!(!persistence.delete(id).unwrap());
    }
}
