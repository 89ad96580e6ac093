//! Storage node registry
//!
//! Tracks cluster membership from registrations and heartbeats. Liveness is
//! derived, not stored: a node is healthy iff its last heartbeat is younger
//! than the timeout, computed at each call. No background sweeper is needed.

use crate::error::{ClusterError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;
use std::time::Duration;

/// Default heartbeat timeout: nodes are offline after 30 s of silence
pub const DEFAULT_HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(30);

/// Derived liveness status of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Healthy,
    Offline,
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Offline => write!(f, "offline"),
        }
    }
}

/// Metadata about a registered storage node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInfo {
    pub node_id: String,

    /// HTTP address, e.g. "localhost:9001"
    pub address: String,

    pub status: NodeStatus,

    /// Number of chunks held, from the last heartbeat
    pub total_chunks: usize,

    /// Last heartbeat timestamp
    pub last_seen: DateTime<Utc>,

    /// Total storage capacity in bytes (0 = unreported)
    pub capacity: u64,

    /// Used storage in bytes
    pub used: u64,
}

/// Registry of storage nodes, keyed by node id
pub struct Registry {
    nodes: RwLock<HashMap<String, NodeInfo>>,
    heartbeat_timeout: Duration,
}

impl Registry {
    /// Create a registry with the given heartbeat timeout
    pub fn new(heartbeat_timeout: Duration) -> Self {
        Self {
            nodes: RwLock::new(HashMap::new()),
            heartbeat_timeout,
        }
    }

    /// Register a node; idempotent, overwriting any existing entry
    pub fn register(&self, node_id: &str, address: &str) {
        let mut nodes = self.nodes.write().expect("registry lock poisoned");
        nodes.insert(
            node_id.to_string(),
            NodeInfo {
                node_id: node_id.to_string(),
                address: address.to_string(),
                status: NodeStatus::Healthy,
                total_chunks: 0,
                last_seen: Utc::now(),
                capacity: 0,
                used: 0,
            },
        );
    }

    /// Record a heartbeat from a node
    pub fn heartbeat(&self, node_id: &str, total_chunks: usize, used: u64) -> Result<()> {
        let mut nodes = self.nodes.write().expect("registry lock poisoned");
        let node = nodes
            .get_mut(node_id)
            .ok_or_else(|| ClusterError::UnknownNode(node_id.to_string()))?;

        node.last_seen = Utc::now();
        node.total_chunks = total_chunks;
        node.used = used;
        node.status = NodeStatus::Healthy;
        Ok(())
    }

    fn derive_status(&self, node: &NodeInfo) -> NodeStatus {
        let age = Utc::now().signed_duration_since(node.last_seen);
        match age.to_std() {
            Ok(age) if age < self.heartbeat_timeout => NodeStatus::Healthy,
            Ok(_) => NodeStatus::Offline,
            // last_seen in the future: clock skew, count as fresh
            Err(_) => NodeStatus::Healthy,
        }
    }

    /// Snapshot of nodes whose heartbeat is within the timeout
    pub fn healthy_nodes(&self) -> Vec<NodeInfo> {
        let nodes = self.nodes.read().expect("registry lock poisoned");
        nodes
            .values()
            .filter(|n| self.derive_status(n) == NodeStatus::Healthy)
            .cloned()
            .collect()
    }

    /// Snapshot of nodes whose heartbeat has expired
    pub fn offline_nodes(&self) -> Vec<NodeInfo> {
        let nodes = self.nodes.read().expect("registry lock poisoned");
        nodes
            .values()
            .filter(|n| self.derive_status(n) == NodeStatus::Offline)
            .map(|n| {
                let mut n = n.clone();
                n.status = NodeStatus::Offline;
                n
            })
            .collect()
    }

    /// Snapshot of all registered nodes with freshly derived status
    pub fn all_nodes(&self) -> Vec<NodeInfo> {
        let nodes = self.nodes.read().expect("registry lock poisoned");
        nodes
            .values()
            .map(|n| {
                let mut n = n.clone();
                n.status = self.derive_status(&n);
                n
            })
            .collect()
    }

    /// Look up a single node
    pub fn get(&self, node_id: &str) -> Option<NodeInfo> {
        let nodes = self.nodes.read().expect("registry lock poisoned");
        nodes.get(node_id).cloned()
    }

    /// Remove a node from the registry
    pub fn remove(&self, node_id: &str) {
        let mut nodes = self.nodes.write().expect("registry lock poisoned");
        nodes.remove(node_id);
    }

    /// Number of registered nodes
    pub fn len(&self) -> usize {
        self.nodes.read().expect("registry lock poisoned").len()
    }

    /// Whether any nodes are registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
