//! Storage configuration.

use std::path::PathBuf;

use crate::error::{StorageError, StorageResult};

/// Cloud Storage interoperability endpoint.
pub const DEFAULT_ENDPOINT_URL: &str = "https://storage.googleapis.com";

/// Configuration for the S3-compatible client.
#[derive(Debug, Clone)]
pub struct S3Config {
    /// S3 API endpoint URL
    pub endpoint_url: String,
    /// Access key ID (HMAC key for Cloud Storage)
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Region ("auto" works for Cloud Storage and R2)
    pub region: String,
}

impl S3Config {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            endpoint_url: std::env::var("STORAGE_ENDPOINT_URL")
                .unwrap_or_else(|_| DEFAULT_ENDPOINT_URL.to_string()),
            access_key_id: std::env::var("STORAGE_ACCESS_KEY_ID")
                .map_err(|_| StorageError::config_error("STORAGE_ACCESS_KEY_ID not set"))?,
            secret_access_key: std::env::var("STORAGE_SECRET_ACCESS_KEY")
                .map_err(|_| StorageError::config_error("STORAGE_SECRET_ACCESS_KEY not set"))?,
            region: std::env::var("STORAGE_REGION").unwrap_or_else(|_| "auto".to_string()),
        })
    }
}

/// Which object store implementation to use.
#[derive(Debug, Clone)]
pub enum StorageBackend {
    S3(S3Config),
    Local(PathBuf),
}

impl StorageBackend {
    /// Select the backend from `STORAGE_BACKEND` (`s3` or `local`).
    pub fn from_env() -> StorageResult<Self> {
        let backend = std::env::var("STORAGE_BACKEND").unwrap_or_else(|_| "s3".to_string());
        match backend.to_lowercase().as_str() {
            "s3" | "gcs" => Ok(StorageBackend::S3(S3Config::from_env()?)),
            "local" => {
                let root = std::env::var("STORAGE_LOCAL_ROOT")
                    .unwrap_or_else(|_| "/tmp/finreel/objects".to_string());
                Ok(StorageBackend::Local(PathBuf::from(root)))
            }
            other => Err(StorageError::config_error(format!(
                "Unknown STORAGE_BACKEND: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_s3_config_requires_keys() {
        std::env::remove_var("STORAGE_ACCESS_KEY_ID");
        std::env::remove_var("STORAGE_SECRET_ACCESS_KEY");
        assert!(S3Config::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_s3_config_defaults() {
        std::env::set_var("STORAGE_ACCESS_KEY_ID", "key");
        std::env::set_var("STORAGE_SECRET_ACCESS_KEY", "secret");
        std::env::remove_var("STORAGE_ENDPOINT_URL");
        std::env::remove_var("STORAGE_REGION");
        let config = S3Config::from_env().unwrap();
        assert_eq!(config.endpoint_url, DEFAULT_ENDPOINT_URL);
        assert_eq!(config.region, "auto");
        std::env::remove_var("STORAGE_ACCESS_KEY_ID");
        std::env::remove_var("STORAGE_SECRET_ACCESS_KEY");
    }

    #[test]
    #[serial]
    fn test_local_backend() {
        std::env::set_var("STORAGE_BACKEND", "local");
        std::env::set_var("STORAGE_LOCAL_ROOT", "/srv/objects");
        match StorageBackend::from_env().unwrap() {
            StorageBackend::Local(root) => assert_eq!(root, PathBuf::from("/srv/objects")),
            other => panic!("unexpected backend: {:?}", other),
        }
        std::env::remove_var("STORAGE_BACKEND");
        std::env::remove_var("STORAGE_LOCAL_ROOT");
    }

    #[test]
    #[serial]
    fn test_unknown_backend() {
        std::env::set_var("STORAGE_BACKEND", "ftp");
        assert!(StorageBackend::from_env().is_err());
        std::env::remove_var("STORAGE_BACKEND");
    }
}
