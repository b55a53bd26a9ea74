//! Encoder abstraction.

use async_trait::async_trait;

use crate::command::FfmpegCommand;
use crate::error::MediaResult;

/// Runs an encoder command to completion.
///
/// Implementations classify a non-zero exit as `MediaError::FfmpegFailed`
/// and never retry.
#[async_trait]
pub trait Encoder: Send + Sync {
    async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()>;
}
