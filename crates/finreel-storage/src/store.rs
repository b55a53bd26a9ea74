//! Object store abstraction.

use std::path::Path;

use async_trait::async_trait;
use finreel_models::ObjectPath;

use crate::error::StorageResult;

/// Content type attached to rendered videos.
pub const VIDEO_MP4: &str = "video/mp4";

/// Byte transfer between object storage and the local filesystem.
///
/// Implementations perform no retries; failures surface to the caller.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Download `path` to `local`, creating parent directories and
    /// overwriting any existing file.
    async fn download(&self, path: &ObjectPath, local: &Path) -> StorageResult<()>;

    /// Upload `local` to `path` with the given content type.
    async fn upload(&self, local: &Path, path: &ObjectPath, content_type: &str) -> StorageResult<()>;
}
