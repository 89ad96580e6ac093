//! Shoal cluster membership and placement
//!
//! This crate provides:
//! - [`HashRing`]: consistent-hash ring with virtual nodes for chunk
//!   placement and replica selection
//! - [`Registry`]: heartbeat-driven node registry with derived liveness
//! - [`protocol`]: JSON wire types for coordinator <-> node traffic

pub mod error;
pub mod protocol;
pub mod registry;
pub mod ring;

pub use error::{ClusterError, Result};
pub use registry::{NodeInfo, NodeStatus, Registry, DEFAULT_HEARTBEAT_TIMEOUT};
pub use ring::{HashRing, VIRTUAL_NODES_PER_NODE};
