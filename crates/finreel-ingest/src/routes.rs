//! HTTP routes.

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::config::IngestConfig;
use crate::error::redact_server_errors;
use crate::handlers::{healthz, receive};
use crate::ingestor::Ingestor;

/// Create the event receiver router.
pub fn create_router(
    ingestor: Arc<Ingestor>,
    config: &IngestConfig,
    metrics_handle: Option<PrometheusHandle>,
) -> Router {
    let mut event_routes = Router::new()
        .route("/", post(receive))
        .route("/events", post(receive))
        .route("/healthz", get(healthz));
    if config.is_production() {
        event_routes = event_routes.layer(middleware::from_fn(redact_server_errors));
    }
    let event_routes = event_routes
        .layer(RequestBodyLimitLayer::new(config.max_body_size))
        .with_state(ingestor);

    match metrics_handle {
        Some(handle) => event_routes.route("/metrics", get(move || async move { handle.render() })),
        None => event_routes,
    }
}
