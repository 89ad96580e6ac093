//! Storage node client
//!
//! Outbound HTTP to storage nodes for chunk placement and retrieval.
//! Failures here are expected operational events: one unreachable replica is
//! logged and the caller moves on to the next, then to the local fallback.

use shoal_cluster::protocol::{RetrieveChunkResponse, StoreChunkRequest, StoreChunkResponse};
use std::time::Duration;
use tracing::{debug, warn};

/// Error types for node client operations
#[derive(Debug, thiserror::Error)]
pub enum NodeClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store failed: {0}")]
    StoreFailed(String),

    #[error("Chunk not found: {0}")]
    ChunkNotFound(String),

    #[error("No nodes available")]
    NoNodesAvailable,

    #[error("All nodes failed to store chunk")]
    AllNodesFailed,
}

/// Configuration for the node client
#[derive(Debug, Clone)]
pub struct NodeClientConfig {
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for NodeClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Client for communicating with storage nodes
pub struct NodeClient {
    client: reqwest::Client,
}

impl NodeClient {
    /// Create a new node client
    pub fn new(config: NodeClientConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("Failed to build HTTP client");
        Self { client }
    }

    /// Store a chunk on one storage node
    pub async fn store_chunk(
        &self,
        address: &str,
        chunk_hash: &str,
        data: &[u8],
    ) -> Result<(), NodeClientError> {
        let url = format!("http://{}/store", address);
        let request = StoreChunkRequest {
            chunk_hash: chunk_hash.to_string(),
            chunk_data: data.to_vec(),
        };

        let response: StoreChunkResponse = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.success {
            debug!(node = %address, hash = %&chunk_hash[..8], "Chunk stored on node");
            Ok(())
        } else {
            Err(NodeClientError::StoreFailed(
                response.error.unwrap_or_else(|| "unknown".to_string()),
            ))
        }
    }

    /// Retrieve a chunk from one storage node
    pub async fn retrieve_chunk(
        &self,
        address: &str,
        chunk_hash: &str,
    ) -> Result<Vec<u8>, NodeClientError> {
        let url = format!("http://{}/retrieve/{}", address, chunk_hash);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(NodeClientError::ChunkNotFound(chunk_hash.to_string()));
        }

        let body: RetrieveChunkResponse = response.json().await?;
        if body.success {
            debug!(node = %address, hash = %&chunk_hash[..8], "Chunk retrieved from node");
            Ok(body.chunk_data)
        } else {
            Err(NodeClientError::ChunkNotFound(chunk_hash.to_string()))
        }
    }

    /// Store a chunk on multiple replicas in sequence
    ///
    /// Returns the addresses that accepted the chunk; a chunk counts as
    /// placed if at least one replica took it. Errs only when every replica
    /// failed.
    pub async fn store_replicated(
        &self,
        addresses: &[String],
        chunk_hash: &str,
        data: &[u8],
    ) -> Result<Vec<String>, NodeClientError> {
        if addresses.is_empty() {
            return Err(NodeClientError::NoNodesAvailable);
        }

        let mut successful = Vec::new();
        for address in addresses {
            match self.store_chunk(address, chunk_hash, data).await {
                Ok(()) => successful.push(address.clone()),
                Err(e) => {
                    warn!(node = %address, error = %e, "Failed to store chunk on replica");
                }
            }
        }

        if successful.is_empty() {
            Err(NodeClientError::AllNodesFailed)
        } else {
            Ok(successful)
        }
    }

    /// Retrieve a chunk from the first replica that answers
    pub async fn retrieve_from_any(
        &self,
        addresses: &[String],
        chunk_hash: &str,
    ) -> Result<Vec<u8>, NodeClientError> {
        if addresses.is_empty() {
            return Err(NodeClientError::NoNodesAvailable);
        }

        for address in addresses {
            match self.retrieve_chunk(address, chunk_hash).await {
                Ok(data) => return Ok(data),
                Err(e) => {
                    warn!(node = %address, error = %e, "Failed to get chunk from replica");
                }
            }
        }

        Err(NodeClientError::ChunkNotFound(chunk_hash.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_timeout() {
        let config = NodeClientConfig::default();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_replicated_store_requires_targets() {
        let client = NodeClient::new(NodeClientConfig::default());
        let result = client.store_replicated(&[], &"ab".repeat(32), b"data").await;
        assert!(matches!(result, Err(NodeClientError::NoNodesAvailable)));
    }

    #[tokio::test]
    async fn test_retrieve_from_any_requires_targets() {
        let client = NodeClient::new(NodeClientConfig::default());
        let result = client.retrieve_from_any(&[], &"ab".repeat(32)).await;
        assert!(matches!(result, Err(NodeClientError::NoNodesAvailable)));
    }
}
