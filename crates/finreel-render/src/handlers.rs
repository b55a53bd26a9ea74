//! Request handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use finreel_models::{ConcatRequest, RenderResponse, SlateRequest};

use crate::error::ApiResult;
use crate::state::AppState;

/// `POST /concat` and `POST /stitch`.
pub async fn concat(
    State(state): State<AppState>,
    payload: Result<Json<ConcatRequest>, JsonRejection>,
) -> ApiResult<Json<RenderResponse>> {
    let Json(request) = payload?;
    Ok(Json(state.service.concat(&request).await?))
}

/// `POST /slate`.
pub async fn slate(
    State(state): State<AppState>,
    payload: Result<Json<SlateRequest>, JsonRejection>,
) -> ApiResult<Json<RenderResponse>> {
    let Json(request) = payload?;
    Ok(Json(state.service.slate(&request).await?))
}

/// Liveness probe.
pub async fn healthz() -> &'static str {
    "ok"
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}
