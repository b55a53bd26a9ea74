//! API error types.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use finreel_media::MediaError;
use finreel_storage::StorageError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Encoder error: {0}")]
    Media(#[from] MediaError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(e) if e.is_validation() => StatusCode::BAD_REQUEST,
            ApiError::Media(MediaError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Storage(_) | ApiError::Media(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            match self.stderr() {
                Some(stderr) => error!(status = status.as_u16(), stderr = %stderr, "Render failed: {}", self),
                None => error!(status = status.as_u16(), "Render failed: {}", self),
            }
        }

        (status, Json(ErrorResponse { detail: self.to_string() })).into_response()
    }
}

impl ApiError {
    fn stderr(&self) -> Option<&str> {
        match self {
            ApiError::Media(e) => e.stderr(),
            _ => None,
        }
    }
}
