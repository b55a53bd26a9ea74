//! Which uploads are statements.

use crate::config::{IngestConfig, DEFAULT_FILENAME, DEFAULT_PREFIX};
use crate::event::StorageObjectEvent;

/// Accepts PDF uploads under a prefix with a fixed file name.
#[derive(Debug, Clone)]
pub struct IngestFilter {
    prefix: String,
    filename: String,
}

impl Default for IngestFilter {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX, DEFAULT_FILENAME)
    }
}

impl IngestFilter {
    pub fn new(prefix: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            filename: filename.into(),
        }
    }

    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(config.prefix.clone(), config.filename.clone())
    }

    /// The reason `event` is skipped, or `None` if it should be ingested.
    pub fn rejection(&self, event: &StorageObjectEvent) -> Option<&'static str> {
        if !event.name.starts_with(&self.prefix) {
            return Some("outside prefix");
        }
        if !event.name.ends_with(&self.filename) {
            return Some("unexpected file name");
        }
        if !event.content_type().contains("pdf") {
            return Some("not a pdf");
        }
        None
    }

    pub fn accepts(&self, event: &StorageObjectEvent) -> bool {
        self.rejection(event).is_none()
    }
}
