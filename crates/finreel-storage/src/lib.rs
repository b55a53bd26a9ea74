//! Object storage adapter.
//!
//! This crate provides:
//! - The `ObjectStore` download/upload contract
//! - An S3-compatible implementation (Cloud Storage interop, R2, MinIO)
//! - A local filesystem implementation for development

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod local;
pub mod s3;
pub mod store;

pub use config::{S3Config, StorageBackend};
pub use error::{StorageError, StorageResult};
pub use local::LocalObjectStore;
pub use s3::S3ObjectStore;
pub use store::{ObjectStore, VIDEO_MP4};

/// Build the configured object store.
pub fn object_store_from_env() -> StorageResult<Arc<dyn ObjectStore>> {
    Ok(match StorageBackend::from_env()? {
        StorageBackend::S3(config) => Arc::new(S3ObjectStore::new(config)),
        StorageBackend::Local(root) => Arc::new(LocalObjectStore::new(root)),
    })
}
