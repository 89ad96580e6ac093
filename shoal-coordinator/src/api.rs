//! Coordinator HTTP API
//!
//! Client-facing routes: upload, download, file listing, dedup stats, and
//! health. Cluster-facing routes live in [`crate::cluster_api`].

use crate::error::ApiError;
use crate::state::{AppState, UploadResponse};
use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Json, Multipart, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::{error, info};
use uuid::Uuid;

/// Multipart uploads are buffered in memory; this bounds the request body.
/// Larger-than-memory files are out of scope for the current design.
const MAX_UPLOAD_BYTES: usize = 1024 * 1024 * 1024;

/// Client-facing routes
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route(
            "/upload",
            post(upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/download/:file_id", get(download))
        .route("/files", get(list_files))
        .route("/stats", get(stats))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "time": Utc::now().to_rfc3339(),
        "storage_nodes": state.registry.healthy_nodes().len(),
    }))
}

async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut file_data: Option<Bytes> = None;
    let mut file_name = String::from("upload.bin");
    let mut password: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InputInvalid(e.to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                if let Some(name) = field.file_name() {
                    file_name = name.to_string();
                }
                file_data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::InputInvalid(e.to_string()))?,
                );
            }
            Some("password") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::InputInvalid(e.to_string()))?;
                if !text.is_empty() {
                    password = Some(text);
                }
            }
            _ => {}
        }
    }

    let data = file_data.ok_or_else(|| ApiError::InputInvalid("missing file field".to_string()))?;

    let response = state.upload(file_name, data, password.as_deref()).await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct DownloadQuery {
    password: Option<String>,
}

async fn download(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<Uuid>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let (file, hashes, key) = state
        .open_download(file_id, query.password.as_deref())
        .await?;

    info!(
        file_id = %file_id,
        file_name = %file.file_name,
        chunks = hashes.len(),
        encrypted = file.encrypted,
        "Downloading file"
    );

    // The first chunk is fetched before any byte is streamed, so a wrong
    // password or a lost chunk still surfaces as a proper status code
    let first = match hashes.first() {
        Some(hash) => Some(Bytes::from(
            state.fetch_plain_chunk(hash, key.as_ref()).await?,
        )),
        None => None,
    };

    // Remaining chunks are fetched one at a time by a worker; memory stays
    // at O(one chunk). Bytes already on the wire cannot be unsent: a
    // mid-stream failure is logged and the body just ends short.
    let (tx, rx) = tokio::sync::mpsc::channel::<Result<Bytes, std::io::Error>>(1);
    {
        let state = state.clone();
        let key = key.clone();
        tokio::spawn(async move {
            for (i, hash) in hashes.into_iter().enumerate().skip(1) {
                match state.fetch_plain_chunk(&hash, key.as_ref()).await {
                    Ok(data) => {
                        if tx.send(Ok(Bytes::from(data))).await.is_err() {
                            return; // client went away
                        }
                    }
                    Err(e) => {
                        error!(error = %e, chunk = i, "Download aborted mid-stream");
                        return;
                    }
                }
            }
        });
    }

    let body = Body::from_stream(
        tokio_stream::iter(first.map(Ok::<_, std::io::Error>)).chain(ReceiverStream::new(rx)),
    );

    Response::builder()
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={}", file.file_name),
        )
        .body(body)
        .map_err(|e| ApiError::Internal(e.to_string()))
}

async fn list_files(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let files = state.db.list_files().await?;
    Ok(Json(json!({
        "count": files.len(),
        "files": files,
    })))
}

async fn stats(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let stats = state.db.stats().await?;
    Ok(Json(stats))
}
