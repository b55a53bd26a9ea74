//! HTTP event receiver.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use tracing::{info_span, Instrument};

use crate::error::IngestResult;
use crate::event::StorageObjectEvent;
use crate::ingestor::{IngestReport, Ingestor};

fn header<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers.get(name).and_then(|v| v.to_str().ok()).unwrap_or("")
}

/// `POST /` and `POST /events`: a CloudEvents binary-mode storage event.
pub async fn receive(
    State(ingestor): State<Arc<Ingestor>>,
    headers: HeaderMap,
    payload: Result<Json<StorageObjectEvent>, JsonRejection>,
) -> IngestResult<Json<IngestReport>> {
    let span = info_span!(
        "storage_event",
        ce_id = header(&headers, "ce-id"),
        ce_type = header(&headers, "ce-type"),
        ce_subject = header(&headers, "ce-subject"),
    );

    async move {
        let Json(event) = payload?;
        Ok(Json(ingestor.handle(&event).await?))
    }
    .instrument(span)
    .await
}

/// Liveness probe.
pub async fn healthz() -> &'static str {
    "ok"
}
