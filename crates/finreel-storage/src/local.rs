//! Filesystem-backed object store for local development and tests.
//!
//! `gs://bucket/a/b.mp4` maps to `<root>/bucket/a/b.mp4`. The content type
//! of each upload is kept in a sibling `<file>.content-type` file.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use finreel_models::ObjectPath;

use crate::error::{StorageError, StorageResult};
use crate::store::ObjectStore;

const CONTENT_TYPE_SUFFIX: &str = ".content-type";

/// Object store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem location of an object.
    pub fn resolve(&self, path: &ObjectPath) -> StorageResult<PathBuf> {
        let mut resolved = self.root.clone();
        for part in [path.bucket(), path.object()] {
            for component in Path::new(part).components() {
                match component {
                    Component::Normal(segment) => resolved.push(segment),
                    _ => {
                        return Err(StorageError::InvalidKey(path.to_string()));
                    }
                }
            }
        }
        Ok(resolved)
    }

    /// Content type recorded for an uploaded object.
    pub async fn content_type(&self, path: &ObjectPath) -> StorageResult<Option<String>> {
        let sidecar = sidecar_path(&self.resolve(path)?);
        match tokio::fs::read_to_string(&sidecar).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn sidecar_path(file: &Path) -> PathBuf {
    let mut name = file.as_os_str().to_owned();
    name.push(CONTENT_TYPE_SUFFIX);
    PathBuf::from(name)
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn download(&self, path: &ObjectPath, local: &Path) -> StorageResult<()> {
        let source = self.resolve(path)?;
        if !tokio::fs::try_exists(&source).await? {
            return Err(StorageError::not_found(path.to_string()));
        }

        if let Some(parent) = local.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(&source, local)
            .await
            .map_err(|e| StorageError::download_failed(format!("{}: {}", path, e)))?;

        debug!("Copied {} to {}", source.display(), local.display());
        Ok(())
    }

    async fn upload(&self, local: &Path, path: &ObjectPath, content_type: &str) -> StorageResult<()> {
        let dest = self.resolve(path)?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::copy(local, &dest)
            .await
            .map_err(|e| StorageError::upload_failed(format!("{}: {}", path, e)))?;
        tokio::fs::write(sidecar_path(&dest), content_type).await?;

        debug!("Copied {} to {}", local.display(), dest.display());
        Ok(())
    }
}
