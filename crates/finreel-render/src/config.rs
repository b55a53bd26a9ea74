//! Render service configuration.

use std::path::PathBuf;

use finreel_media::slate::DEFAULT_FONT_FILE;
use finreel_media::DEFAULT_TIMEOUT_SECS;

/// Render server configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Root for per-request scratch directories
    pub work_dir: PathBuf,
    /// Encoder binary name or path
    pub ffmpeg_bin: String,
    /// Encoder timeout in seconds (0 disables)
    pub encoder_timeout_secs: u64,
    /// Encodes allowed to run at once
    pub max_concurrent: usize,
    /// Font used for slates
    pub font_file: String,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max request body size
    pub max_body_size: usize,
    /// Expose Prometheus metrics at /metrics
    pub metrics_enabled: bool,
    /// Environment (development/production)
    pub environment: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            work_dir: std::env::temp_dir().join("finreel"),
            ffmpeg_bin: "ffmpeg".to_string(),
            encoder_timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_concurrent: 2,
            font_file: DEFAULT_FONT_FILE.to_string(),
            cors_origins: vec!["*".to_string()],
            max_body_size: 1024 * 1024, // 1MB
            metrics_enabled: true,
            environment: "development".to_string(),
        }
    }
}

impl RenderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: std::env::var("RENDER_HOST").unwrap_or(defaults.host),
            // Cloud Run injects PORT.
            port: std::env::var("PORT")
                .or_else(|_| std::env::var("RENDER_PORT"))
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            work_dir: std::env::var("RENDER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            ffmpeg_bin: std::env::var("FFMPEG_BIN").unwrap_or(defaults.ffmpeg_bin),
            encoder_timeout_secs: std::env::var("ENCODER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.encoder_timeout_secs),
            max_concurrent: std::env::var("RENDER_MAX_CONCURRENT")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_concurrent),
            font_file: std::env::var("SLATE_FONT_FILE").unwrap_or(defaults.font_file),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
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

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}
