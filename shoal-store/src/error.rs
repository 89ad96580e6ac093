//! Error types for chunk persistence

use thiserror::Error;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors from the chunk directory and dedup index
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Chunk not found: {0}")]
    ChunkNotFound(String),

    #[error("Invalid chunk hash: {0}")]
    InvalidHash(String),

    #[error("Chunk index corrupt: {0}")]
    IndexCorrupt(String),
}
