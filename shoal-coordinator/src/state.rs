//! Coordinator application state and pipelines
//!
//! Holds the process-wide singletons (dedup index, node registry, placement
//! ring, metadata store, node client), all constructed in `main` and threaded
//! into handlers explicitly so tests can run several isolated instances in
//! one process.

use crate::error::ApiError;
use crate::node_client::{NodeClient, NodeClientConfig};
use bytes::Bytes;
use serde::Serialize;
use shoal_cluster::{HashRing, Registry};
use shoal_core::{chunk_all, seal, ContentHash, EncryptionKey, ShoalError};
use shoal_metadata::{CreateFile, Database, FileRecord};
use shoal_store::{ChunkStore, StorageDescriptor};
use std::io::Cursor;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default replica count per chunk
pub const DEFAULT_REPLICATION: usize = 3;

/// Coordinator runtime configuration
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Base directory for the local dedup store
    pub storage_path: std::path::PathBuf,

    /// Replicas per chunk on the distributed path
    pub replication: usize,

    /// Node heartbeat timeout
    pub heartbeat_timeout: Duration,
}

/// Response to a completed upload
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub file_id: Uuid,
    pub file_name: String,
    pub size: i64,
    pub chunk_hashes: Vec<String>,
    pub chunks_stored: usize,
    pub dedup_ratio: f64,
    pub encrypted: bool,
}

/// Shared state for all coordinator handlers
pub struct AppState {
    pub db: Database,
    pub dedup: ChunkStore,
    pub registry: Registry,
    pub ring: HashRing,
    pub nodes: NodeClient,
    pub replication: usize,
}

impl AppState {
    /// Build the coordinator state
    pub fn new(db: Database, config: &CoordinatorConfig) -> Result<Self, ApiError> {
        let dedup = ChunkStore::open(&config.storage_path)?;

        Ok(Self {
            db,
            dedup,
            registry: Registry::new(config.heartbeat_timeout),
            ring: HashRing::new(),
            nodes: NodeClient::new(NodeClientConfig::default()),
            replication: config.replication,
        })
    }

    // =========================================================================
    // UPLOAD PIPELINE
    // =========================================================================

    /// Chunk, optionally seal, deduplicate, place, and record a file
    pub async fn upload(
        &self,
        file_name: String,
        data: Bytes,
        password: Option<&str>,
    ) -> Result<UploadResponse, ApiError> {
        let file_id = Uuid::new_v4();
        let file_size = data.len() as i64;

        let key = password.map(|p| EncryptionKey::derive(p, None));
        let encrypted = key.is_some();

        info!(
            file_id = %file_id,
            file_name = %file_name,
            size = file_size,
            encrypted = encrypted,
            "Uploading file"
        );

        let chunks = chunk_all(Cursor::new(data))?;
        debug!(count = chunks.len(), "Created content-defined chunks");

        let mut chunk_hashes = Vec::with_capacity(chunks.len());
        let mut new_chunks_stored = 0usize;
        let total_chunks = chunks.len();

        for chunk in chunks {
            // Sealing changes the bytes, so the dedup hash is recomputed
            // over what actually gets stored
            let (hash, payload) = match &key {
                Some(key) => seal_chunk(&chunk.data, key)?,
                None => (chunk.hash, chunk.data.to_vec()),
            };

            let (descriptor, placed_new) = self.place_chunk(&hash, &payload).await?;
            let db_is_new = self
                .db
                .upsert_chunk(&hash, payload.len() as i32, &descriptor.to_string())
                .await?;

            if placed_new && db_is_new {
                new_chunks_stored += 1;
                debug!(hash = %&hash[..8], size = payload.len(), "Chunk stored (new)");
            } else {
                debug!(hash = %&hash[..8], "Chunk deduplicated");
            }

            chunk_hashes.push(hash);
        }

        // The file record lands only after every chunk has confirmed
        // placement, and links only after the file record exists
        self.db
            .create_file(CreateFile {
                file_id,
                file_name: file_name.clone(),
                file_size,
                encrypted,
                salt: key.as_ref().map(|k| k.salt_hex()),
            })
            .await?;

        for (order, hash) in chunk_hashes.iter().enumerate() {
            self.db
                .link_file_chunk(file_id, hash, order as i32)
                .await?;
        }

        let dedup_ratio = total_chunks as f64 / new_chunks_stored.max(1) as f64;
        info!(
            file_id = %file_id,
            chunks = total_chunks,
            stored = new_chunks_stored,
            dedup_ratio = dedup_ratio,
            "Upload complete"
        );

        Ok(UploadResponse {
            file_id,
            file_name,
            size: file_size,
            chunk_hashes,
            chunks_stored: new_chunks_stored,
            dedup_ratio,
            encrypted,
        })
    }

    /// Place one chunk: replica fan-out when healthy nodes exist, the local
    /// dedup store otherwise (or when every replica fails)
    async fn place_chunk(
        &self,
        hash: &str,
        payload: &[u8],
    ) -> Result<(StorageDescriptor, bool), ApiError> {
        if !self.registry.healthy_nodes().is_empty() {
            let targets = self.ring.replicas(hash, self.replication);
            let addresses = self.resolve_addresses(&targets);

            if !addresses.is_empty() {
                match self.nodes.store_replicated(&addresses, hash, payload).await {
                    Ok(accepted) => {
                        debug!(
                            hash = %&hash[..8],
                            replicas = accepted.len(),
                            "Chunk distributed"
                        );
                        return Ok((StorageDescriptor::Distributed(targets[0].clone()), true));
                    }
                    Err(e) => {
                        warn!(error = %e, hash = %&hash[..8], "Distribution failed, storing locally");
                    }
                }
            }
        }

        let (descriptor, is_new) = self.dedup.insert(hash, payload)?;
        Ok((descriptor, is_new))
    }

    /// Map ring node ids to HTTP addresses via the registry, dropping ids
    /// with no registry entry
    fn resolve_addresses(&self, node_ids: &[String]) -> Vec<String> {
        node_ids
            .iter()
            .filter_map(|id| self.registry.get(id).map(|n| n.address))
            .collect()
    }

    // =========================================================================
    // DOWNLOAD PIPELINE
    // =========================================================================

    /// Load the file record and, when encrypted, re-derive the key
    pub async fn open_download(
        &self,
        file_id: Uuid,
        password: Option<&str>,
    ) -> Result<(FileRecord, Vec<String>, Option<EncryptionKey>), ApiError> {
        let file = self
            .db
            .get_file(file_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("file {}", file_id)))?;

        let key = if file.encrypted {
            let password = password.ok_or(ApiError::AuthRequired)?;
            let salt = file
                .salt
                .as_deref()
                .ok_or_else(|| ApiError::Internal("encrypted file has no salt".to_string()))?;
            Some(EncryptionKey::derive_with_salt_hex(password, salt)?)
        } else {
            None
        };

        let hashes = self.db.get_file_chunks(file_id).await?;
        Ok((file, hashes, key))
    }

    /// Fetch one chunk: replicas first, local fallback second
    pub async fn fetch_chunk(&self, hash: &str) -> Result<Vec<u8>, ApiError> {
        if !self.ring.is_empty() {
            let targets = self.ring.replicas(hash, self.replication);
            let addresses = self.resolve_addresses(&targets);

            if !addresses.is_empty() {
                if let Ok(data) = self.nodes.retrieve_from_any(&addresses, hash).await {
                    return Ok(data);
                }
            }
        }

        match self.dedup.fetch(hash) {
            Ok(data) => Ok(data),
            Err(shoal_store::StoreError::ChunkNotFound(_)) => {
                Err(ApiError::ChunkLost(hash.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Fetch one chunk and decrypt it when a key is present
    pub async fn fetch_plain_chunk(
        &self,
        hash: &str,
        key: Option<&EncryptionKey>,
    ) -> Result<Vec<u8>, ApiError> {
        let data = self.fetch_chunk(hash).await?;
        match key {
            Some(key) => Ok(shoal_core::open(&data, key)?),
            None => Ok(data),
        }
    }

    // =========================================================================
    // FILE DELETION (refcount GC)
    // =========================================================================

    /// Delete a file, cascading reference-count decrements to its chunks
    ///
    /// Chunks whose count reaches zero disappear from the metadata store and
    /// from the local dedup store. Replicas on storage nodes are left in
    /// place (no re-replication or remote GC).
    pub async fn delete_file(&self, file_id: Uuid) -> Result<(), ApiError> {
        let file = self
            .db
            .get_file(file_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("file {}", file_id)))?;

        let hashes = self.db.get_file_chunks(file_id).await?;

        // Links cascade with the file row; chunk refcounts drop after
        self.db.delete_file(file_id).await?;

        for hash in &hashes {
            let remaining = self.db.release_chunk(hash).await?;

            if self.dedup.contains(hash) {
                if let Err(e) = self.dedup.release(hash) {
                    warn!(error = %e, hash = %&hash[..8], "Local release failed");
                }
            }

            debug!(hash = %&hash[..8], remaining = remaining, "Chunk released");
        }

        info!(file_id = %file_id, file_name = %file.file_name, "File deleted");
        Ok(())
    }
}

/// Seal a chunk and recompute its content hash over the sealed bytes
///
/// Two users sealing the same plaintext under different keys produce
/// different hashes and do not share storage; that is the intended
/// confidentiality/dedup trade-off.
pub fn seal_chunk(data: &[u8], key: &EncryptionKey) -> Result<(String, Vec<u8>), ShoalError> {
    let sealed = seal(data, key)?;
    let hash = ContentHash::compute(&sealed).to_hex();
    Ok((hash, sealed))
}
