//! Wire types for coordinator <-> storage node HTTP traffic
//!
//! All bodies are JSON; chunk payloads travel base64-encoded inside the
//! JSON, matching the `chunk_data` field layout the nodes expect.

use crate::registry::NodeInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Serde helper: `Vec<u8>` as base64 text in JSON
pub mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

/// POST /store body: place a chunk on a storage node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreChunkRequest {
    pub chunk_hash: String,
    #[serde(with = "base64_bytes")]
    pub chunk_data: Vec<u8>,
}

/// POST /store response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreChunkResponse {
    pub success: bool,
    pub node_id: String,
    pub chunk_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /retrieve/{hash} response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieveChunkResponse {
    pub success: bool,
    pub chunk_hash: String,
    #[serde(with = "base64_bytes")]
    pub chunk_data: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /chunks response: hashes held by a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkListResponse {
    pub node_id: String,
    pub count: usize,
    pub chunks: Vec<String>,
}

/// GET /health response from a storage node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeHealthResponse {
    pub status: String,
    pub node_id: String,
    pub address: String,
    pub total_chunks: usize,
    pub timestamp: DateTime<Utc>,
}

/// POST /register body sent by a node on startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub node_id: String,
    pub address: String,
    #[serde(default)]
    pub capacity: u64,
}

/// POST /register response from the coordinator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub status: String,
    pub node_id: String,
}

/// POST /heartbeat body, sent every 10 s by each node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatMessage {
    pub node_id: String,
    pub address: String,
    pub total_chunks: usize,
    #[serde(default)]
    pub used: u64,
    pub timestamp: DateTime<Utc>,
}

/// GET /nodes response from the coordinator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeListResponse {
    pub count: usize,
    pub nodes: Vec<NodeInfo>,
}
