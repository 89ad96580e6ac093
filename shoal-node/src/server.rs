//! Storage node HTTP server
//!
//! Exposes local chunk CRUD over HTTP for the coordinator's replica
//! fan-out: `/store`, `/retrieve/{hash}`, `/chunks`, `/health`. Chunk files
//! land in the sharded chunk directory; the held-hash set is rebuilt from a
//! directory scan on startup so a restarted node resumes serving its chunks.

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use shoal_cluster::protocol::{
    ChunkListResponse, NodeHealthResponse, RetrieveChunkResponse, StoreChunkRequest,
    StoreChunkResponse,
};
use shoal_store::{ChunkDir, Result as StoreResult};
use std::collections::HashSet;
use std::path::Path as FsPath;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// Shared state for one storage node
pub struct NodeState {
    pub node_id: String,

    /// Advertised HTTP address, e.g. "localhost:9001"
    pub address: String,

    store: ChunkDir,
    held: RwLock<HashSet<String>>,
}

impl NodeState {
    /// Open the chunk directory and recover the held set from disk
    pub fn open(node_id: String, address: String, storage_path: &FsPath) -> StoreResult<Self> {
        let store = ChunkDir::open(storage_path)?;
        let recovered = store.scan()?;

        if !recovered.is_empty() {
            info!(
                node_id = %node_id,
                chunks = recovered.len(),
                "Recovered chunks from disk"
            );
        }

        Ok(Self {
            node_id,
            address,
            store,
            held: RwLock::new(recovered.into_iter().collect()),
        })
    }

    /// Number of chunks this node currently holds
    pub async fn chunk_count(&self) -> usize {
        self.held.read().await.len()
    }
}

/// Build the node's HTTP router
pub fn router(state: Arc<NodeState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/store", post(store_chunk))
        .route("/retrieve/:hash", get(retrieve_chunk))
        .route("/chunks", get(list_chunks))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<Arc<NodeState>>) -> Json<NodeHealthResponse> {
    Json(NodeHealthResponse {
        status: "healthy".to_string(),
        node_id: state.node_id.clone(),
        address: state.address.clone(),
        total_chunks: state.chunk_count().await,
        timestamp: Utc::now(),
    })
}

async fn store_chunk(
    State(state): State<Arc<NodeState>>,
    Json(req): Json<StoreChunkRequest>,
) -> impl IntoResponse {
    if let Err(e) = state.store.write(&req.chunk_hash, &req.chunk_data) {
        error!(error = %e, hash = %req.chunk_hash, "Failed to write chunk");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(StoreChunkResponse {
                success: false,
                node_id: state.node_id.clone(),
                chunk_hash: req.chunk_hash,
                error: Some(e.to_string()),
            }),
        );
    }

    state.held.write().await.insert(req.chunk_hash.clone());
    info!(hash = %&req.chunk_hash[..8], size = req.chunk_data.len(), "Chunk stored");

    (
        StatusCode::OK,
        Json(StoreChunkResponse {
            success: true,
            node_id: state.node_id.clone(),
            chunk_hash: req.chunk_hash,
            error: None,
        }),
    )
}

async fn retrieve_chunk(
    State(state): State<Arc<NodeState>>,
    Path(hash): Path<String>,
) -> impl IntoResponse {
    if !state.held.read().await.contains(&hash) {
        return (
            StatusCode::NOT_FOUND,
            Json(RetrieveChunkResponse {
                success: false,
                chunk_hash: hash,
                chunk_data: Vec::new(),
                error: Some("chunk not found".to_string()),
            }),
        );
    }

    match state.store.read(&hash) {
        Ok(data) => (
            StatusCode::OK,
            Json(RetrieveChunkResponse {
                success: true,
                chunk_hash: hash,
                chunk_data: data,
                error: None,
            }),
        ),
        Err(e) => {
            warn!(error = %e, hash = %hash, "Failed to read chunk");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RetrieveChunkResponse {
                    success: false,
                    chunk_hash: hash,
                    chunk_data: Vec::new(),
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

async fn list_chunks(State(state): State<Arc<NodeState>>) -> Json<ChunkListResponse> {
    let held = state.held.read().await;
    let chunks: Vec<String> = held.iter().cloned().collect();
    Json(ChunkListResponse {
        node_id: state.node_id.clone(),
        count: chunks.len(),
        chunks,
    })
}
