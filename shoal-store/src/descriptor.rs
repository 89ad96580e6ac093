//! Chunk storage descriptors
//!
//! Records where a chunk's authoritative bytes live: a local filesystem path
//! on the coordinator, or on storage nodes keyed by the primary replica's id.
//! Serialized as the plain string stored in the `chunks.storage_path` column
//! (`/some/path` or `distributed:<node_id>`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

const DISTRIBUTED_PREFIX: &str = "distributed:";

/// Placement record for a stored chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StorageDescriptor {
    /// Bytes live in the coordinator-local chunk store
    Local(PathBuf),

    /// Bytes live on storage nodes; the id is the primary replica
    Distributed(String),
}

impl StorageDescriptor {
    /// Whether this chunk was placed on storage nodes
    pub fn is_distributed(&self) -> bool {
        matches!(self, Self::Distributed(_))
    }
}

impl fmt::Display for StorageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Distributed(node_id) => write!(f, "{}{}", DISTRIBUTED_PREFIX, node_id),
        }
    }
}

impl From<String> for StorageDescriptor {
    fn from(s: String) -> Self {
        match s.strip_prefix(DISTRIBUTED_PREFIX) {
            Some(node_id) => Self::Distributed(node_id.to_string()),
            None => Self::Local(PathBuf::from(s)),
        }
    }
}

impl From<StorageDescriptor> for String {
    fn from(d: StorageDescriptor) -> Self {
        d.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_roundtrip() {
        let desc = StorageDescriptor::Local(PathBuf::from("/data/chunks/ab/abcd"));
        let s = desc.to_string();
        assert_eq!(s, "/data/chunks/ab/abcd");
        assert_eq!(StorageDescriptor::from(s), desc);
        assert!(!desc.is_distributed());
    }

    #[test]
    fn test_distributed_roundtrip() {
        let desc = StorageDescriptor::Distributed("node-1".to_string());
        let s = desc.to_string();
        assert_eq!(s, "distributed:node-1");
        assert_eq!(StorageDescriptor::from(s), desc);
        assert!(desc.is_distributed());
    }
}
