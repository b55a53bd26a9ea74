//! Prometheus metrics for the ingestion trigger.

use metrics::counter;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

pub const INGEST_EVENTS_TOTAL: &str = "finreel_ingest_events_total";

/// Install the Prometheus recorder and return the render handle.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Count a handled event by outcome.
pub fn record_event(outcome: &str) {
    counter!(INGEST_EVENTS_TOTAL, "outcome" => outcome.to_string()).increment(1);
}
