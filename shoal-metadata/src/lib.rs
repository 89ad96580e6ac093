//! Shoal Metadata Store
//!
//! Durable file and chunk metadata on PostgreSQL:
//! - `files`: one row per uploaded file (size, encryption flag, salt)
//! - `chunks`: one row per unique chunk hash with a reference count
//! - `file_chunks`: the ordered file -> chunk mapping
//!
//! Reference counts here mirror the coordinator's in-memory dedup index and
//! drive chunk garbage collection on file deletion.

pub mod models;
pub mod postgres;

pub use models::{ChunkRecord, CreateFile, FileChunkLink, FileRecord, StoreStats};
pub use postgres::{Database, DbConfig, DbError, Result};
