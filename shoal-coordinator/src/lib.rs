//! Shoal coordinator
//!
//! The coordinator drives the whole pipeline: content-defined chunking,
//! optional sealing, global deduplication, consistent-hash placement,
//! replica fan-out to storage nodes, and durable file/chunk metadata.

pub mod api;
pub mod cluster_api;
pub mod error;
pub mod node_client;
pub mod state;

pub use error::ApiError;
pub use node_client::{NodeClient, NodeClientConfig, NodeClientError};
pub use state::{seal_chunk, AppState, CoordinatorConfig, UploadResponse, DEFAULT_REPLICATION};
