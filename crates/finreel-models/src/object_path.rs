//! Object storage path parsing.
//!
//! Paths name a bucket and an object key, either as a URI
//! (`gs://bucket/videos/final.mp4`) or in slash-separated form
//! (`gs/bucket/videos/final.mp4`). The key may itself contain `/`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Malformed object path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("object path is empty")]
    Empty,

    #[error("object path has no bucket: {0}")]
    MissingBucket(String),

    #[error("object path has no object key: {0}")]
    MissingObject(String),
}

/// A parsed `<scheme>/<bucket>/<object...>` path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectPath {
    scheme: String,
    bucket: String,
    object: String,
}

impl ObjectPath {
    /// Parse a storage path.
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PathError::Empty);
        }

        let (scheme, rest) = match trimmed.split_once("://") {
            Some((scheme, rest)) => (scheme, rest),
            None => trimmed.split_once('/').unwrap_or((trimmed, "")),
        };

        let (bucket, object) = rest.split_once('/').unwrap_or((rest, ""));

        if bucket.is_empty() {
            return Err(PathError::MissingBucket(raw.to_string()));
        }
        if object.is_empty() || object.ends_with('/') {
            return Err(PathError::MissingObject(raw.to_string()));
        }

        Ok(Self {
            scheme: scheme.to_string(),
            bucket: bucket.to_string(),
            object: object.to_string(),
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object key within the bucket.
    pub fn object(&self) -> &str {
        &self.object
    }

    /// Final segment of the key.
    pub fn file_name(&self) -> &str {
        self.object.rsplit('/').next().unwrap_or(&self.object)
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", self.scheme, self.bucket, self.object)
    }
}

impl FromStr for ObjectPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ObjectPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ObjectPath> for String {
    fn from(path: ObjectPath) -> Self {
        path.to_string()
    }
}
