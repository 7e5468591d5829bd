use crate::storage::StoreError;
use crate::transcribe::TranscribeError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::fmt;
use tracing::error;

/// Error surface of the HTTP API.
///
/// Every variant renders as `{"ok": false, "message": ...}` with the
/// matching status code, mirroring the `{"ok": true, ...}` success
/// bodies.
#[derive(Debug)]
pub enum ApiError {
    /// Shared token mismatch on session start/finish
    Unauthorized,

    /// Malformed or incomplete request (missing fields, bad indices)
    Validation(String),

    /// Referenced artifact does not exist
    NotFound(String),

    /// Upload exceeded the artifact size cap
    PayloadTooLarge(String),

    /// An external tool failed; message carries its diagnostics
    External(String),

    Internal(anyhow::Error),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthorized => write!(f, "unauthorized"),
            ApiError::Validation(msg) => write!(f, "validation failed: {}", msg),
            ApiError::NotFound(msg) => write!(f, "not found: {}", msg),
            ApiError::PayloadTooLarge(msg) => write!(f, "payload too large: {}", msg),
            ApiError::External(msg) => write!(f, "external tool failed: {}", msg),
            ApiError::Internal(err) => write!(f, "internal error: {}", err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "invalid token".to_string()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg.clone()),
            ApiError::External(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            ApiError::Internal(err) => {
                error!("Internal error: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };

        (status, Json(json!({ "ok": false, "message": message }))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidFolder(_) => ApiError::Validation(err.to_string()),
            StoreError::ArtifactTooLarge { .. } => ApiError::PayloadTooLarge(err.to_string()),
            StoreError::Source(_) => ApiError::Validation(err.to_string()),
            StoreError::Io(e) => ApiError::Internal(e.into()),
        }
    }
}

impl From<TranscribeError> for ApiError {
    fn from(err: TranscribeError) -> Self {
        match err {
            TranscribeError::MissingArtifact(_) => ApiError::NotFound(err.to_string()),
            TranscribeError::Tool { .. } | TranscribeError::TimedOut { .. } => {
                ApiError::External(err.to_string())
            }
            TranscribeError::Io(e) => ApiError::Internal(e.into()),
        }
    }
}
