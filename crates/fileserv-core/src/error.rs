use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// API error taxonomy: validation and conflicts map to 400, missing
/// sources/targets to 404, everything unexpected to 500 with the raw
/// message surfaced (internal tool, not multi-tenant).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing required parameter '{0}'")]
    MissingParam(&'static str),
    #[error("{0}")]
    InvalidName(String),
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("not a folder: {0}")]
    NotAFolder(String),
    #[error("destination already exists: {0}")]
    AlreadyExists(String),
    #[error("no file provided")]
    NoFile,
    #[error("file type not allowed: {0}")]
    UnsupportedType(String),
    #[error("file too large: {size} bytes (max {max})")]
    TooLarge { size: u64, max: u64 },
    #[error("invalid upload request: {0}")]
    Multipart(String),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingParam(_)
            | ApiError::InvalidName(_)
            | ApiError::InvalidPath(_)
            | ApiError::AlreadyExists(_)
            | ApiError::NoFile
            | ApiError::UnsupportedType(_)
            | ApiError::TooLarge { .. }
            | ApiError::Multipart(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) | ApiError::NotAFolder(_) => StatusCode::NOT_FOUND,
            ApiError::Io(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Wire shape shared by every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    result: bool,
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("request failed: {:#}", self);
        }
        let body = ErrorBody {
            result: false,
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
