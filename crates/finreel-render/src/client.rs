//! HTTP client for the render service, used by pipeline workers.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use finreel_models::{ConcatRequest, RenderResponse, SlateRequest};

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid render service URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Render service rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ClientError {
    /// The service timed out or is unavailable; the call may be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Rejected { status, .. } => matches!(status, 502..=504),
            ClientError::Network(e) => e.is_connect() || e.is_timeout(),
            ClientError::InvalidUrl(_) => false,
        }
    }
}

/// Configuration for the render client.
#[derive(Debug, Clone)]
pub struct RenderClientConfig {
    /// Base URL of the render service
    pub base_url: String,
    /// Request timeout; covers the whole encode
    pub timeout: Duration,
}

impl Default for RenderClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout: Duration::from_secs(900),
        }
    }
}

impl RenderClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("RENDER_SERVICE_URL").unwrap_or(defaults.base_url),
            timeout: std::env::var("RENDER_SERVICE_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }
}

#[derive(Deserialize)]
struct HealthBody {
    status: String,
}

/// Client for the render service.
pub struct RenderClient {
    http: Client,
    base_url: Url,
}

impl RenderClient {
    pub fn new(config: RenderClientConfig) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("finreel-render-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        // A trailing slash makes `join` append rather than replace the last segment.
        let mut base = config.base_url;
        if !base.ends_with('/') {
            base.push('/');
        }

        Ok(Self {
            http,
            base_url: Url::parse(&base)?,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(RenderClientConfig::from_env())
    }

    /// Stitch `clip_paths` into `output_path`.
    pub async fn concat(&self, clip_paths: Vec<String>, output_path: &str) -> ClientResult<RenderResponse> {
        let request = ConcatRequest::new(clip_paths, output_path);
        self.post("concat", &request).await
    }

    /// Render a title slate.
    pub async fn slate(&self, request: &SlateRequest) -> ClientResult<RenderResponse> {
        self.post("slate", request).await
    }

    /// True when the service answers its health endpoint.
    pub async fn health_check(&self) -> ClientResult<bool> {
        let url = self.base_url.join("health")?;

        match self.http.get(url).send().await {
            Ok(response) if response.status().is_success() => {
                let health: HealthBody = response.json().await?;
                Ok(health.status == "healthy" || health.status == "ok")
            }
            Ok(response) => {
                warn!("Render service health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Render service health check error: {}", e);
                Ok(false)
            }
        }
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> ClientResult<RenderResponse> {
        let url = self.base_url.join(path)?;
        debug!("Sending render request to {}", url);

        let response = self.http.post(url).json(body).send().await?;
        Self::parse(response).await
    }

    async fn parse(response: Response) -> ClientResult<RenderResponse> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = RenderClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout, Duration::from_secs(900));
    }

    #[test]
    fn test_base_url_with_path_prefix() {
        let client = RenderClient::new(RenderClientConfig {
            base_url: "http://render.internal/v1".to_string(),
            ..RenderClientConfig::default()
        })
        .unwrap();
        assert_eq!(
            client.base_url.join("concat").unwrap().as_str(),
            "http://render.internal/v1/concat"
        );
    }

    #[test]
    fn test_retryable() {
        let gateway = ClientError::Rejected {
            status: 504,
            body: String::new(),
        };
        let invalid = ClientError::Rejected {
            status: 400,
            body: String::new(),
        };
        assert!(gateway.is_retryable());
        assert!(!invalid.is_retryable());
    }
}
