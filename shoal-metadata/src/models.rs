//! Database models for shoal metadata
//!
//! These structs map directly to PostgreSQL tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An uploaded file; immutable after creation
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FileRecord {
    pub file_id: Uuid,
    pub file_name: String,
    pub file_size: i64,

    /// Whether chunks were sealed with a password-derived key
    pub encrypted: bool,

    /// Hex-encoded key-derivation salt; present iff `encrypted`
    pub salt: Option<String>,

    pub uploaded_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters for creating a new file record
#[derive(Debug, Clone)]
pub struct CreateFile {
    pub file_id: Uuid,
    pub file_name: String,
    pub file_size: i64,
    pub encrypted: bool,
    pub salt: Option<String>,
}

/// A deduplicated chunk row
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// SHA-256 of the stored (post-encryption) bytes, lowercase hex
    pub chunk_hash: String,
    pub chunk_size: i32,
    pub ref_count: i32,

    /// Placement record: local path or "distributed:<node_id>"
    pub storage_path: String,

    pub created_at: DateTime<Utc>,
}

/// Ordered link from a file to one of its chunks
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FileChunkLink {
    pub id: i64,
    pub file_id: Uuid,
    pub chunk_hash: String,
    pub chunk_order: i32,
}

/// Aggregate deduplication statistics over the chunks table
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StoreStats {
    pub unique_chunks: i64,
    pub total_references: i64,
    pub storage_used: i64,
    pub space_saved: i64,
    pub dedup_ratio: f64,
}
