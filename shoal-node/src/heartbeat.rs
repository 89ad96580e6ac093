//! Coordinator registration and heartbeats
//!
//! On startup the node registers itself once; afterwards a 10 s ticker
//! reports liveness and the current chunk count. The coordinator derives
//! node health from heartbeat age, so a silent node drops out of placement
//! without any action on this side.

use crate::server::NodeState;
use chrono::Utc;
use shoal_cluster::protocol::{HeartbeatMessage, RegisterRequest, RegisterResponse};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Heartbeat cadence
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

/// Background client that keeps the coordinator aware of this node
pub struct CoordinatorLink {
    state: Arc<NodeState>,
    coordinator: String,
    client: reqwest::Client,
}

impl CoordinatorLink {
    pub fn new(state: Arc<NodeState>, coordinator: String) -> Self {
        Self {
            state,
            coordinator,
            client: reqwest::Client::new(),
        }
    }

    /// Register with the coordinator
    pub async fn register(&self) {
        let url = format!("http://{}/register", self.coordinator);
        let req = RegisterRequest {
            node_id: self.state.node_id.clone(),
            address: self.state.address.clone(),
            capacity: 0,
        };

        match self.client.post(&url).json(&req).send().await {
            Ok(resp) if resp.status().is_success() => {
                match resp.json::<RegisterResponse>().await {
                    Ok(body) => info!(node_id = %body.node_id, "Registered with coordinator"),
                    Err(e) => warn!(error = %e, "Malformed register response"),
                }
            }
            Ok(resp) => {
                warn!(status = %resp.status(), "Coordinator rejected registration");
            }
            Err(e) => {
                warn!(error = %e, coordinator = %self.coordinator, "Failed to register");
            }
        }
    }

    /// Run the heartbeat loop; never returns
    pub async fn run(&self) {
        let url = format!("http://{}/heartbeat", self.coordinator);
        let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);

        loop {
            interval.tick().await;

            let heartbeat = HeartbeatMessage {
                node_id: self.state.node_id.clone(),
                address: self.state.address.clone(),
                total_chunks: self.state.chunk_count().await,
                used: 0,
                timestamp: Utc::now(),
            };

            match self.client.post(&url).json(&heartbeat).send().await {
                Ok(resp) if resp.status().is_success() => {
                    debug!(chunks = heartbeat.total_chunks, "Heartbeat sent");
                }
                Ok(resp) => {
                    // Coordinator restarted and forgot us; re-register
                    warn!(status = %resp.status(), "Heartbeat rejected, re-registering");
                    self.register().await;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to send heartbeat");
                }
            }
        }
    }
}
