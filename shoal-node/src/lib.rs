//! Shoal storage node
//!
//! A storage node persists chunk replicas on local disk, serves them back
//! over HTTP, and heartbeats to the coordinator so it stays eligible for
//! placement.

pub mod heartbeat;
pub mod server;

pub use heartbeat::{CoordinatorLink, HEARTBEAT_INTERVAL};
pub use server::{router, NodeState};
