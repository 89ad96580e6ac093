//! Error types for cluster membership

use thiserror::Error;

/// Result type alias for cluster operations
pub type Result<T> = std::result::Result<T, ClusterError>;

/// Errors from the registry and placement layer
#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    #[error("No nodes available")]
    NoNodesAvailable,
}
