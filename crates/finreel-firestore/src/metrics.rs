//! Firestore request metrics.

use metrics::{counter, histogram};

const REQUESTS: &str = "firestore_requests_total";
const LATENCY: &str = "firestore_request_duration_seconds";

/// Count one finished request and its duration, labelled by operation and
/// the HTTP status it resolved to.
pub fn record_request(operation: &str, status: u16, latency_ms: f64) {
    let operation = operation.to_string();
    counter!(REQUESTS, "operation" => operation.clone(), "status" => status.to_string()).increment(1);
    histogram!(LATENCY, "operation" => operation).record(latency_ms / 1000.0);
}
