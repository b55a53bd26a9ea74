//! Structured logging for render operations.

use std::time::Instant;

use tracing::{error, info, warn, Span};

/// Logs the lifecycle of one render request with its operation and
/// destination attached to every event.
#[derive(Debug, Clone)]
pub struct OperationLogger {
    operation: String,
    output_path: String,
    started: Instant,
}

impl OperationLogger {
    pub fn new(operation: &str, output_path: &str) -> Self {
        Self {
            operation: operation.to_string(),
            output_path: output_path.to_string(),
            started: Instant::now(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            operation = %self.operation,
            output_path = %self.output_path,
            "Render started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            operation = %self.operation,
            output_path = %self.output_path,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Render progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            operation = %self.operation,
            output_path = %self.output_path,
            "Render warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            operation = %self.operation,
            output_path = %self.output_path,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Render failed: {}", message
        );
    }

    pub fn log_completion(&self) {
        info!(
            operation = %self.operation,
            output_path = %self.output_path,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Render completed"
        );
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span carrying the operation context.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "render",
            operation = %self.operation,
            output_path = %self.output_path
        )
    }
}
