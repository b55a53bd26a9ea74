//! Ingestion trigger configuration.

/// Default object prefix watched for statement uploads.
pub const DEFAULT_PREFIX: &str = "statements/";
/// Default object name suffix of a statement upload.
pub const DEFAULT_FILENAME: &str = "/original.pdf";

/// Ingestion receiver configuration.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Object names must start with this
    pub prefix: String,
    /// Object names must end with this
    pub filename: String,
    /// Max event body size
    pub max_body_size: usize,
    /// Expose Prometheus metrics at /metrics
    pub metrics_enabled: bool,
    /// Environment (development/production)
    pub environment: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8081,
            prefix: DEFAULT_PREFIX.to_string(),
            filename: DEFAULT_FILENAME.to_string(),
            max_body_size: 256 * 1024,
            metrics_enabled: true,
            environment: "development".to_string(),
        }
    }
}

impl IngestConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: std::env::var("INGEST_HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .or_else(|_| std::env::var("INGEST_PORT"))
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            prefix: std::env::var("INGEST_PREFIX").unwrap_or(defaults.prefix),
            filename: std::env::var("INGEST_FILENAME").unwrap_or(defaults.filename),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.metrics_enabled),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}
