//! Ingestion errors.

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::http::{header, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use finreel_firestore::FirestoreError;

pub type IngestResult<T> = Result<T, IngestError>;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Malformed event: {0}")]
    InvalidEvent(String),

    #[error("Store error: {0}")]
    Store(#[from] FirestoreError),
}

impl IngestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            IngestError::InvalidEvent(_) => StatusCode::BAD_REQUEST,
            // 5xx makes the event infrastructure redeliver.
            IngestError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for IngestError {
    fn from(rejection: JsonRejection) -> Self {
        IngestError::InvalidEvent(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Ingestion failed");
        }

        (status, Json(ErrorResponse { detail: self.to_string() })).into_response()
    }
}

/// Body detail served in place of server errors in production.
pub const SERVER_ERROR_DETAIL: &str = "Internal server error";

/// Replace the detail of 5xx responses with a generic message.
pub async fn redact_server_errors(request: Request<Body>, next: Next) -> Response {
    let response = next.run(request).await;
    if !response.status().is_server_error() {
        return response;
    }

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    let body = serde_json::json!({ "detail": SERVER_ERROR_DETAIL }).to_string();
    Response::from_parts(parts, Body::from(body))
}
