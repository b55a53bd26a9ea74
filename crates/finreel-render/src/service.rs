//! Concat and slate rendering.
//!
//! Each call validates its request, waits for an encoder slot, works inside
//! its own scratch directory and uploads only a fully encoded file. The
//! scratch directory is removed whatever the outcome.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::Instrument;

use finreel_media::concat::{CONCAT_LIST_FILE, CONCAT_OUTPUT_FILE};
use finreel_media::slate::{SLATE_OUTPUT_FILE, SLATE_TEXT_FILE};
use finreel_media::{
    clip_file_name, concat_command, slate_command, write_concat_list, Encoder, MediaError, ScratchDir,
    SlateGeometry, SlateStyle,
};
use finreel_models::{ConcatRequest, EncodingProfile, ObjectPath, RenderResponse, SlateRequest};
use finreel_storage::{ObjectStore, StorageError, VIDEO_MP4};

use crate::config::RenderConfig;
use crate::error::{ApiError, ApiResult};
use crate::logging::OperationLogger;
use crate::metrics;

/// Renders videos from object storage back to object storage.
pub struct RenderService {
    storage: Arc<dyn ObjectStore>,
    encoder: Arc<dyn Encoder>,
    work_dir: PathBuf,
    profile: EncodingProfile,
    style: SlateStyle,
    permits: Arc<Semaphore>,
}

impl RenderService {
    pub fn new(storage: Arc<dyn ObjectStore>, encoder: Arc<dyn Encoder>, config: &RenderConfig) -> Self {
        Self {
            storage,
            encoder,
            work_dir: config.work_dir.clone(),
            profile: EncodingProfile::default(),
            style: SlateStyle::default().with_font_file(config.font_file.clone()),
            permits: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Concatenate clips, in order, into one video at `outputPath`.
    pub async fn concat(&self, request: &ConcatRequest) -> ApiResult<RenderResponse> {
        let logger = OperationLogger::new("concat", &request.output_path);
        let span = logger.create_span();

        async {
            let (clips, output) = match parse_concat(request) {
                Ok(parsed) => parsed,
                Err(e) => {
                    metrics::record_render("concat", "invalid");
                    return Err(e);
                }
            };

            logger.log_start(&format!("{} clips", clips.len()));
            let _permit = self.acquire().await?;
            let scratch = ScratchDir::create(&self.work_dir, "concat").await?;

            let result = self.run_concat(&scratch, &clips, &output, &logger).await;
            self.finish(scratch, result, &logger).await?;

            Ok(RenderResponse::ok(request.output_path.clone()))
        }
        .instrument(span)
        .await
    }

    /// Render a title card with `text` centered on black.
    pub async fn slate(&self, request: &SlateRequest) -> ApiResult<RenderResponse> {
        let logger = OperationLogger::new("slate", &request.output_path);
        let span = logger.create_span();

        async {
            let output = match request
                .validate()
                .map_err(ApiError::Validation)
                .and_then(|_| parse_path(&request.output_path))
            {
                Ok(output) => output,
                Err(e) => {
                    metrics::record_render("slate", "invalid");
                    return Err(e);
                }
            };

            logger.log_start(&format!(
                "{}x{} for {}s",
                request.width(),
                request.height(),
                request.duration_secs()
            ));
            let _permit = self.acquire().await?;
            let scratch = ScratchDir::create(&self.work_dir, "slate").await?;

            let result = self.run_slate(&scratch, request, &output, &logger).await;
            self.finish(scratch, result, &logger).await?;

            Ok(RenderResponse::ok(request.output_path.clone()))
        }
        .instrument(span)
        .await
    }

    async fn run_concat(
        &self,
        scratch: &ScratchDir,
        clips: &[ObjectPath],
        output: &ObjectPath,
        logger: &OperationLogger,
    ) -> ApiResult<()> {
        let mut local_clips = Vec::with_capacity(clips.len());
        for (index, clip) in clips.iter().enumerate() {
            let local = scratch.file(&clip_file_name(index));
            self.storage.download(clip, &local).await?;
            local_clips.push(local);
        }
        logger.log_progress(&format!("downloaded {} clips", local_clips.len()));

        let list = scratch.file(CONCAT_LIST_FILE);
        write_concat_list(&list, &local_clips).await?;

        let encoded = scratch.file(CONCAT_OUTPUT_FILE);
        self.encoder
            .run(&concat_command(&list, &encoded, &self.profile))
            .await?;
        logger.log_progress("encoded");

        self.storage.upload(&encoded, output, VIDEO_MP4).await?;
        Ok(())
    }

    async fn run_slate(
        &self,
        scratch: &ScratchDir,
        request: &SlateRequest,
        output: &ObjectPath,
        logger: &OperationLogger,
    ) -> ApiResult<()> {
        // The text reaches the encoder only through this file.
        let text_file = scratch.file(SLATE_TEXT_FILE);
        tokio::fs::write(&text_file, request.text.as_bytes())
            .await
            .map_err(MediaError::from)?;

        let geometry = SlateGeometry {
            duration_secs: request.duration_secs(),
            width: request.width(),
            height: request.height(),
        };
        let encoded = scratch.file(SLATE_OUTPUT_FILE);
        self.encoder
            .run(&slate_command(geometry, &self.style, &text_file, &encoded, &self.profile))
            .await?;
        logger.log_progress("encoded");

        self.storage.upload(&encoded, output, VIDEO_MP4).await?;
        Ok(())
    }

    /// Remove the scratch directory, then report the outcome.
    async fn finish(&self, scratch: ScratchDir, result: ApiResult<()>, logger: &OperationLogger) -> ApiResult<()> {
        if let Err(e) = scratch.close().await {
            logger.log_warning(&format!("failed to remove scratch directory: {}", e));
        }

        match &result {
            Ok(()) => {
                metrics::record_render(logger.operation(), "ok");
                logger.log_completion();
            }
            Err(e) => {
                let outcome = match e {
                    ApiError::Media(MediaError::Timeout(_)) => "timeout",
                    _ => "failed",
                };
                metrics::record_render(logger.operation(), outcome);
                logger.log_error(&e.to_string());
            }
        }
        result
    }

    async fn acquire(&self) -> ApiResult<OwnedSemaphorePermit> {
        if let Ok(permit) = Arc::clone(&self.permits).try_acquire_owned() {
            return Ok(permit);
        }

        metrics::adjust_waiting(1.0);
        let permit = Arc::clone(&self.permits).acquire_owned().await;
        metrics::adjust_waiting(-1.0);
        permit.map_err(|_| ApiError::internal("render service is shutting down"))
    }
}

fn parse_path(raw: &str) -> ApiResult<ObjectPath> {
    ObjectPath::parse(raw).map_err(|e| ApiError::Storage(StorageError::from(e)))
}

fn parse_concat(request: &ConcatRequest) -> ApiResult<(Vec<ObjectPath>, ObjectPath)> {
    request.validate().map_err(ApiError::Validation)?;
    let clips = request
        .clip_paths
        .iter()
        .map(|p| parse_path(p))
        .collect::<ApiResult<Vec<_>>>()?;
    Ok((clips, parse_path(&request.output_path)?))
}
