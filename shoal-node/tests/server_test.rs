//! Storage node HTTP API tests
//!
//! Drives the node router in-process with tower's `oneshot`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use shoal_cluster::protocol::{
    ChunkListResponse, NodeHealthResponse, RetrieveChunkResponse, StoreChunkRequest,
    StoreChunkResponse,
};
use shoal_node::{router, NodeState};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn test_state(tmp: &TempDir) -> Arc<NodeState> {
    Arc::new(
        NodeState::open(
            "test-node".to_string(),
            "localhost:9001".to_string(),
            tmp.path(),
        )
        .unwrap(),
    )
}

fn chunk_hash(data: &[u8]) -> String {
    shoal_core::ContentHash::compute(data).to_hex()
}

async fn body_json<T: serde::de::DeserializeOwned>(body: Body) -> T {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_store_then_retrieve() {
    let tmp = TempDir::new().unwrap();
    let app = router(test_state(&tmp));

    let data = b"replica payload".to_vec();
    let hash = chunk_hash(&data);

    let store_req = StoreChunkRequest {
        chunk_hash: hash.clone(),
        chunk_data: data.clone(),
    };

    let response = app
        .clone()
        .oneshot(
            Request::post("/store")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&store_req).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let store_resp: StoreChunkResponse = body_json(response.into_body()).await;
    assert!(store_resp.success);
    assert_eq!(store_resp.node_id, "test-node");

    let response = app
        .oneshot(
            Request::get(format!("/retrieve/{}", hash))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let retrieve_resp: RetrieveChunkResponse = body_json(response.into_body()).await;
    assert!(retrieve_resp.success);
    assert_eq!(retrieve_resp.chunk_data, data);
}

#[tokio::test]
async fn test_retrieve_missing_chunk_is_404() {
    let tmp = TempDir::new().unwrap();
    let app = router(test_state(&tmp));

    let response = app
        .oneshot(
            Request::get(format!("/retrieve/{}", "0".repeat(64)))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_store_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let state = test_state(&tmp);
    let app = router(state.clone());

    let data = b"stored twice".to_vec();
    let req = StoreChunkRequest {
        chunk_hash: chunk_hash(&data),
        chunk_data: data,
    };
    let body = serde_json::to_vec(&req).unwrap();

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(
                Request::post("/store")
                    .header("content-type", "application/json")
                    .body(Body::from(body.clone()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(state.chunk_count().await, 1);
}

#[tokio::test]
async fn test_chunks_listing_and_health() {
    let tmp = TempDir::new().unwrap();
    let app = router(test_state(&tmp));

    let mut hashes = Vec::new();
    for i in 0..3u8 {
        let data = vec![i; 64];
        let hash = chunk_hash(&data);
        hashes.push(hash.clone());

        let req = StoreChunkRequest {
            chunk_hash: hash,
            chunk_data: data,
        };
        app.clone()
            .oneshot(
                Request::post("/store")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&req).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
    }

    let response = app
        .clone()
        .oneshot(Request::get("/chunks").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let list: ChunkListResponse = body_json(response.into_body()).await;
    assert_eq!(list.count, 3);
    for hash in &hashes {
        assert!(list.chunks.contains(hash));
    }

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let health: NodeHealthResponse = body_json(response.into_body()).await;
    assert_eq!(health.status, "healthy");
    assert_eq!(health.total_chunks, 3);
}

#[tokio::test]
async fn test_restart_recovers_held_chunks() {
    let tmp = TempDir::new().unwrap();

    let data = b"survives restart".to_vec();
    let hash = chunk_hash(&data);

    {
        let app = router(test_state(&tmp));
        let req = StoreChunkRequest {
            chunk_hash: hash.clone(),
            chunk_data: data.clone(),
        };
        app.oneshot(
            Request::post("/store")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&req).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    }

    // A fresh state over the same directory re-admits the chunk
    let app = router(test_state(&tmp));
    let response = app
        .oneshot(
            Request::get(format!("/retrieve/{}", hash))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let resp: RetrieveChunkResponse = body_json(response.into_body()).await;
    assert_eq!(resp.chunk_data, data);
}
