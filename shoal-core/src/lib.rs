//! Shoal Core Library
//!
//! Core abstractions for the shoal distributed file store.
//! This crate provides:
//! - Content-defined chunking (rolling-hash boundary detection)
//! - Cryptographic primitives (SHA-256 hashing, AES-GCM encryption, PBKDF2)
//! - Common error handling

pub mod chunker;
pub mod crypto;
pub mod error;

pub use chunker::{chunk_all, Chunk, ChunkScanner};
pub use crypto::{open, seal, ContentHash, EncryptionKey};
pub use error::{Result, ShoalError};

/// Chunk size bounds
///
/// Boundaries are content-defined between MIN and MAX; the mask targets
/// ~4 MiB average chunks.
pub const MIN_CHUNK_SIZE: usize = 2 * 1024 * 1024; // 2 MiB
pub const AVG_CHUNK_SIZE: usize = 4 * 1024 * 1024; // 4 MiB (target)
pub const MAX_CHUNK_SIZE: usize = 8 * 1024 * 1024; // 8 MiB

/// Rolling hash window, in bytes
pub const WINDOW_SIZE: usize = 48;

/// Boundary mask: a cut happens where the low 20 bits of the rolling hash
/// are zero
pub const BOUNDARY_MASK: u64 = (1 << 20) - 1;
