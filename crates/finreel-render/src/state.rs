//! Application state.

use std::sync::Arc;

use tracing::warn;

use finreel_media::{Encoder, FfmpegRunner};
use finreel_storage::{object_store_from_env, ObjectStore, StorageResult};

use crate::config::RenderConfig;
use crate::service::RenderService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: RenderConfig,
    pub service: Arc<RenderService>,
}

impl AppState {
    pub fn new(config: RenderConfig, storage: Arc<dyn ObjectStore>, encoder: Arc<dyn Encoder>) -> Self {
        let service = RenderService::new(storage, encoder, &config);
        Self {
            config,
            service: Arc::new(service),
        }
    }

    /// Wire the configured object store and the FFmpeg runner.
    pub fn from_env(config: RenderConfig) -> StorageResult<Self> {
        let storage = object_store_from_env()?;

        let runner = FfmpegRunner::new()
            .with_binary(config.ffmpeg_bin.clone())
            .with_timeout(config.encoder_timeout_secs);
        if let Err(e) = runner.locate() {
            // Keep serving /healthz; render requests will fail until the binary appears.
            warn!("{}", e);
        }

        Ok(Self::new(config, storage, Arc::new(runner)))
    }
}
