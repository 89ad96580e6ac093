//! Error types for shoal
//!
//! Provides a unified error type for core operations.

use thiserror::Error;

/// Result type alias for shoal core operations
pub type Result<T> = std::result::Result<T, ShoalError>;

/// Unified error type for the shoal core
#[derive(Error, Debug)]
pub enum ShoalError {
    // ===== Chunking Errors =====
    #[error("Read failed: {0}")]
    Read(#[from] std::io::Error),

    // ===== Cryptography Errors =====
    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Decryption error: {0}")]
    Decryption(String),

    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("Invalid salt: {0}")]
    InvalidSalt(String),

    // ===== Hash Errors =====
    #[error("Invalid chunk hash: {0}")]
    InvalidHash(String),

    #[error("Hash verification failed")]
    HashVerificationFailed,
}
