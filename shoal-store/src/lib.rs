//! Shoal chunk persistence
//!
//! Content-addressed storage for chunk bytes plus the global deduplication
//! index:
//! - [`ChunkDir`]: sharded `<root>/<hash[0..2]>/<hash>` file layout, shared
//!   by the coordinator's local store and every storage node
//! - [`ChunkStore`]: hash → (size, refcount, path) index with refcount
//!   garbage collection and a durable JSON snapshot
//! - [`StorageDescriptor`]: local-vs-distributed placement record

pub mod chunk_dir;
pub mod dedup;
pub mod descriptor;
pub mod error;

pub use chunk_dir::{is_chunk_hash, ChunkDir};
pub use dedup::{ChunkEntry, ChunkStore, DedupStats};
pub use descriptor::StorageDescriptor;
pub use error::{Result, StoreError};
