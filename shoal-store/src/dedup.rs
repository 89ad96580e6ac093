//! Deduplicated chunk store
//!
//! Tracks which chunks exist and how many files reference each one. The
//! first insert of a hash writes the bytes to the backing [`ChunkDir`];
//! subsequent inserts only bump the reference count. A release that drops
//! the count to zero deletes the bytes and the metadata in the same
//! critical section.
//!
//! The in-memory index is snapshotted to `chunk_index.json` after every
//! mutation. The snapshot is advisory: it may trail the live map by one
//! mutation after a crash, which is tolerable because refcounts only drive
//! garbage collection.

use crate::chunk_dir::ChunkDir;
use crate::descriptor::StorageDescriptor;
use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;
use tracing::{debug, warn};

/// Index file name under the store base directory
const INDEX_FILE: &str = "chunk_index.json";

/// Metadata tracked per stored chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkEntry {
    /// SHA-256 hash of the chunk, lowercase hex
    pub hash: String,

    /// Size in bytes as stored
    pub size: usize,

    /// Number of files referencing this chunk
    pub ref_count: u64,

    /// Path where the chunk bytes live
    pub store_path: PathBuf,
}

/// Deduplication statistics
#[derive(Debug, Clone, Serialize)]
pub struct DedupStats {
    pub unique_chunks: usize,
    pub total_references: u64,
    pub storage_used: u64,
    pub space_saved: u64,
    pub dedup_ratio: f64,
}

/// Deduplicated chunk store backed by a sharded chunk directory
pub struct ChunkStore {
    chunks: ChunkDir,
    index: RwLock<HashMap<String, ChunkEntry>>,
    index_path: PathBuf,
}

impl ChunkStore {
    /// Open a chunk store rooted at `base`, loading any existing index
    ///
    /// Chunk bytes live under `<base>/chunks/`, the index snapshot at
    /// `<base>/chunk_index.json`.
    pub fn open(base: impl Into<PathBuf>) -> Result<Self> {
        let base = base.into();
        let chunks = ChunkDir::open(base.join("chunks"))?;
        let index_path = base.join(INDEX_FILE);

        let index = match fs::read(&index_path) {
            Ok(data) => serde_json::from_slice(&data)
                .map_err(|e| StoreError::IndexCorrupt(e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            chunks,
            index: RwLock::new(index),
            index_path,
        })
    }

    /// Store a chunk, deduplicating by hash
    ///
    /// Returns the chunk's storage descriptor and whether the bytes were
    /// newly written. Linearizable with respect to other `insert`/`release`
    /// calls: the whole operation runs under the exclusive index lock.
    pub fn insert(&self, hash: &str, data: &[u8]) -> Result<(StorageDescriptor, bool)> {
        let mut index = self.index.write().expect("dedup index lock poisoned");

        if let Some(entry) = index.get_mut(hash) {
            entry.ref_count += 1;
            let descriptor = StorageDescriptor::Local(entry.store_path.clone());
            self.save_index(&index);
            return Ok((descriptor, false));
        }

        // New chunk: bytes hit the disk before the index is touched, so a
        // failed write leaves the in-memory state unchanged
        let store_path = self.chunks.write(hash, data)?;

        index.insert(
            hash.to_string(),
            ChunkEntry {
                hash: hash.to_string(),
                size: data.len(),
                ref_count: 1,
                store_path: store_path.clone(),
            },
        );
        self.save_index(&index);

        debug!(hash = %&hash[..8], size = data.len(), "Chunk stored");
        Ok((StorageDescriptor::Local(store_path), true))
    }

    /// Read a chunk's bytes from the backing store
    pub fn fetch(&self, hash: &str) -> Result<Vec<u8>> {
        {
            let index = self.index.read().expect("dedup index lock poisoned");
            if !index.contains_key(hash) {
                return Err(StoreError::ChunkNotFound(hash.to_string()));
            }
        }
        self.chunks.read(hash)
    }

    /// Whether a chunk is present in the index
    pub fn contains(&self, hash: &str) -> bool {
        self.index
            .read()
            .expect("dedup index lock poisoned")
            .contains_key(hash)
    }

    /// Current reference count for a chunk, if present
    pub fn ref_count(&self, hash: &str) -> Option<u64> {
        self.index
            .read()
            .expect("dedup index lock poisoned")
            .get(hash)
            .map(|e| e.ref_count)
    }

    /// Drop one reference to a chunk
    ///
    /// When the count reaches zero the bytes and the metadata are deleted
    /// before this call returns.
    pub fn release(&self, hash: &str) -> Result<()> {
        let mut index = self.index.write().expect("dedup index lock poisoned");

        let entry = index
            .get_mut(hash)
            .ok_or_else(|| StoreError::ChunkNotFound(hash.to_string()))?;

        entry.ref_count -= 1;
        if entry.ref_count == 0 {
            self.chunks.remove(hash)?;
            index.remove(hash);
            debug!(hash = %&hash[..8], "Chunk released and deleted");
        }

        self.save_index(&index);
        Ok(())
    }

    /// Deduplication statistics across all stored chunks
    pub fn stats(&self) -> DedupStats {
        let index = self.index.read().expect("dedup index lock poisoned");

        let unique_chunks = index.len();
        let mut storage_used: u64 = 0;
        let mut total_references: u64 = 0;
        for entry in index.values() {
            storage_used += entry.size as u64;
            total_references += entry.ref_count;
        }

        let space_saved = if total_references > unique_chunks as u64 {
            storage_used * (total_references - unique_chunks as u64) / unique_chunks.max(1) as u64
        } else {
            0
        };

        DedupStats {
            unique_chunks,
            total_references,
            storage_used,
            space_saved,
            dedup_ratio: total_references as f64 / unique_chunks.max(1) as f64,
        }
    }

    /// Write the index snapshot, via a temp file so a crash mid-write never
    /// leaves a truncated snapshot behind
    ///
    /// Failures are logged and swallowed; the next mutation retries.
    fn save_index(&self, index: &HashMap<String, ChunkEntry>) {
        let result = (|| -> Result<()> {
            let data = serde_json::to_vec_pretty(index)
                .map_err(|e| StoreError::IndexCorrupt(e.to_string()))?;
            let tmp = self.index_path.with_extension("json.tmp");
            fs::write(&tmp, data)?;
            fs::rename(&tmp, &self.index_path)?;
            Ok(())
        })();

        if let Err(e) = result {
            warn!(error = %e, "Failed to write chunk index snapshot");
        }
    }
}
