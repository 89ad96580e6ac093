//! Coordinator API error taxonomy
//!
//! Local recoverable failures (one replica down) are swallowed by the
//! pipelines and logged; everything here is client-visible.

use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use shoal_core::ShoalError;
use shoal_metadata::DbError;
use shoal_store::StoreError;
use thiserror::Error;

/// Client-visible coordinator errors
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid input: {0}")]
    InputInvalid(String),

    #[error("Password required for encrypted file")]
    AuthRequired,

    #[error("Decryption failed - incorrect password?")]
    DecryptFailed,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Chunk lost: no replica or local copy holds {0}")]
    ChunkLost(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Database error: {0}")]
    Db(#[from] DbError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InputInvalid(_) => StatusCode::BAD_REQUEST,
            Self::AuthRequired | Self::DecryptFailed => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ChunkLost(_)
            | Self::WriteFailed(_)
            | Self::ReadFailed(_)
            | Self::Db(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ChunkNotFound(hash) => Self::NotFound(format!("chunk {}", hash)),
            StoreError::Io(io) => Self::WriteFailed(io.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<ShoalError> for ApiError {
    fn from(e: ShoalError) -> Self {
        match e {
            ShoalError::Decryption(_) => Self::DecryptFailed,
            ShoalError::Read(io) => Self::ReadFailed(io.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}
