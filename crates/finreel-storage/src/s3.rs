//! S3-compatible object store.
//!
//! Talks to any endpoint that speaks the S3 API: the Cloud Storage
//! interoperability endpoint with HMAC keys, R2, or MinIO.

use std::path::Path;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use finreel_models::ObjectPath;

use crate::config::S3Config;
use crate::error::{StorageError, StorageResult};
use crate::store::ObjectStore;

/// Object store backed by the S3 API.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Create a new client from configuration.
    pub fn new(config: S3Config) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "finreel",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(sdk_config),
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self::new(S3Config::from_env()?))
    }

    async fn stream_to_file(body: ByteStream, local: &Path) -> StorageResult<()> {
        if let Some(parent) = local.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::download_failed(format!("Failed to create directory: {}", e))
            })?;
        }

        let mut file = tokio::fs::File::create(local).await.map_err(|e| {
            StorageError::download_failed(format!("Failed to create {}: {}", local.display(), e))
        })?;

        let mut reader = body.into_async_read();
        tokio::io::copy(&mut reader, &mut file)
            .await
            .map_err(|e| StorageError::download_failed(format!("Failed to write file: {}", e)))?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn download(&self, path: &ObjectPath, local: &Path) -> StorageResult<()> {
        debug!("Downloading {} to {}", path, local.display());

        let response = self
            .client
            .get_object()
            .bucket(path.bucket())
            .key(path.object())
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(err) if err.is_no_such_key() => StorageError::not_found(path.to_string()),
                _ => StorageError::download_failed(format!("{}: {}", path, DisplayErrorContext(&e))),
            })?;

        if let Err(e) = Self::stream_to_file(response.body, local).await {
            let _ = tokio::fs::remove_file(local).await;
            return Err(e);
        }

        info!("Downloaded {} to {}", path, local.display());
        Ok(())
    }

    async fn upload(&self, local: &Path, path: &ObjectPath, content_type: &str) -> StorageResult<()> {
        debug!("Uploading {} to {}", local.display(), path);

        let body = ByteStream::from_path(local)
            .await
            .map_err(|e| StorageError::upload_failed(format!("{}: {}", local.display(), e)))?;

        self.client
            .put_object()
            .bucket(path.bucket())
            .key(path.object())
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(format!("{}: {}", path, DisplayErrorContext(&e))))?;

        info!("Uploaded {} to {}", local.display(), path);
        Ok(())
    }
}
