//! Cluster-facing HTTP API
//!
//! Routes used by storage nodes: registration, heartbeats, and the node
//! listing. Registration is idempotent and also (re)inserts the node into
//! the placement ring.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Json, State},
    routing::{get, post},
    Router,
};
use shoal_cluster::protocol::{
    HeartbeatMessage, NodeListResponse, RegisterRequest, RegisterResponse,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Cluster-facing routes
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/heartbeat", post(heartbeat))
        .route("/nodes", get(list_nodes))
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Json<RegisterResponse> {
    state.registry.register(&req.node_id, &req.address);
    state.ring.add_node(&req.node_id);

    info!(node_id = %req.node_id, address = %req.address, "Storage node registered");

    Json(RegisterResponse {
        status: "registered".to_string(),
        node_id: req.node_id,
    })
}

async fn heartbeat(
    State(state): State<Arc<AppState>>,
    Json(msg): Json<HeartbeatMessage>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .registry
        .heartbeat(&msg.node_id, msg.total_chunks, msg.used)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    // A node evicted from the ring for missed heartbeats rejoins here
    if !state.ring.contains_node(&msg.node_id) {
        state.ring.add_node(&msg.node_id);
        info!(node_id = %msg.node_id, "Node rejoined placement ring");
    }

    debug!(node_id = %msg.node_id, chunks = msg.total_chunks, "Heartbeat received");
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

async fn list_nodes(State(state): State<Arc<AppState>>) -> Json<NodeListResponse> {
    let nodes = state.registry.all_nodes();
    Json(NodeListResponse {
        count: nodes.len(),
        nodes,
    })
}
