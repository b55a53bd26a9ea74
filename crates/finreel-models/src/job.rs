//! Render job records.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::job_status::{JobStatus, TransitionError};

/// Default client name when the upload carries none.
pub const DEFAULT_CLIENT_NAME: &str = "Unknown Client";
/// Default uploader identity.
pub const DEFAULT_UPLOADED_BY: &str = "anon";
/// Default upload source.
pub const DEFAULT_SOURCE: &str = "ui";

/// Unique identifier for a render job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Derive the id for an uploaded object.
    ///
    /// The same `(bucket, name, generation)` always yields the same id, so a
    /// redelivered storage event maps onto the job it already created.
    pub fn for_object(bucket: &str, name: &str, generation: Option<&str>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bucket.as_bytes());
        hasher.update(b"/");
        hasher.update(name.as_bytes());
        hasher.update(b"#");
        hasher.update(generation.unwrap_or("").as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reporting cadence of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum StatementType {
    #[default]
    Monthly,
    Quarterly,
    Annual,
}

impl StatementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementType::Monthly => "monthly",
            StatementType::Quarterly => "quarterly",
            StatementType::Annual => "annual",
        }
    }

    /// Parse a statement type, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => Some(StatementType::Monthly),
            "quarterly" => Some(StatementType::Quarterly),
            "annual" => Some(StatementType::Annual),
            _ => None,
        }
    }
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Descriptive metadata captured when a statement is uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntakeMetadata {
    pub client_name: String,
    pub statement_type: StatementType,
    pub period: String,
    pub uploaded_by: String,
    pub source: String,
}

impl Default for IntakeMetadata {
    fn default() -> Self {
        Self {
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            statement_type: StatementType::default(),
            period: String::new(),
            uploaded_by: DEFAULT_UPLOADED_BY.to_string(),
            source: DEFAULT_SOURCE.to_string(),
        }
    }
}

impl IntakeMetadata {
    /// Build from the key/value metadata attached to an upload.
    ///
    /// Only absent keys fall back to defaults; a present value is kept as
    /// sent, even when empty. The second element lists values that were
    /// present but unrecognized (currently only `statementType`), so callers
    /// can log them.
    pub fn from_object_metadata(metadata: &HashMap<String, String>) -> (Self, Vec<String>) {
        let mut meta = Self::default();
        let mut rejected = Vec::new();

        if let Some(v) = metadata.get("clientName") {
            meta.client_name = v.clone();
        }
        if let Some(v) = metadata.get("statementType") {
            match StatementType::parse(v) {
                Some(t) => meta.statement_type = t,
                None => rejected.push(format!("statementType={}", v)),
            }
        }
        if let Some(v) = metadata.get("period") {
            meta.period = v.clone();
        }
        if let Some(v) = metadata.get("uploadedBy") {
            meta.uploaded_by = v.clone();
        }
        if let Some(v) = metadata.get("source") {
            meta.source = v.clone();
        }

        (meta, rejected)
    }
}

/// A render job as persisted in the job store.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,

    /// Object name of the uploaded source document
    pub file_path: String,
    pub bucket: String,

    #[serde(flatten)]
    pub metadata: IntakeMetadata,

    pub parse_result_path: Option<String>,
    pub kpis: Option<serde_json::Value>,
    pub scenes: Option<serde_json::Value>,
    pub output_video_path: Option<String>,

    /// Set only when `status` is `failed`
    pub error: Option<String>,

    /// Worker that currently owns the job
    pub worker_id: Option<String>,

    /// Assigned by the store; `None` until read back
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Job {
    /// A freshly ingested job in the `queued` state.
    pub fn queued(
        id: JobId,
        bucket: impl Into<String>,
        file_path: impl Into<String>,
        metadata: IntakeMetadata,
    ) -> Self {
        Self {
            id,
            status: JobStatus::Queued,
            file_path: file_path.into(),
            bucket: bucket.into(),
            metadata,
            parse_result_path: None,
            kpis: None,
            scenes: None,
            output_video_path: None,
            error: None,
            worker_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Move to `next`, enforcing the transition contract.
    pub fn advance(&mut self, next: JobStatus) -> Result<(), TransitionError> {
        self.status.check_transition(next)?;
        self.status = next;
        if next != JobStatus::Failed {
            self.error = None;
        }
        Ok(())
    }

    /// Mark the job complete with its final video.
    pub fn complete(&mut self, output_video_path: impl Into<String>) -> Result<(), TransitionError> {
        self.advance(JobStatus::Complete)?;
        self.output_video_path = Some(output_video_path.into());
        Ok(())
    }

    /// Mark the job failed with a reason.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), TransitionError> {
        self.advance(JobStatus::Failed)?;
        self.error = Some(error.into());
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_job_id_is_deterministic() {
        let a = JobId::for_object("bucket", "statements/acme/original.pdf", Some("17"));
        let b = JobId::for_object("bucket", "statements/acme/original.pdf", Some("17"));
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_job_id_varies_with_generation() {
        let a = JobId::for_object("bucket", "statements/acme/original.pdf", Some("1"));
        let b = JobId::for_object("bucket", "statements/acme/original.pdf", Some("2"));
        let c = JobId::for_object("other", "statements/acme/original.pdf", Some("1"));
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_metadata_defaults() {
        let (meta, rejected) = IntakeMetadata::from_object_metadata(&HashMap::new());
        assert_eq!(meta.client_name, "Unknown Client");
        assert_eq!(meta.statement_type, StatementType::Monthly);
        assert_eq!(meta.period, "");
        assert_eq!(meta.uploaded_by, "anon");
        assert_eq!(meta.source, "ui");
        assert!(rejected.is_empty());
    }

    #[test]
    fn test_metadata_overrides() {
        let (meta, _) = IntakeMetadata::from_object_metadata(&metadata(&[
            ("clientName", "Acme Corp"),
            ("statementType", "Quarterly"),
            ("period", "2024-Q1"),
            ("uploadedBy", "uid-42"),
            ("source", "api"),
        ]));
        assert_eq!(meta.client_name, "Acme Corp");
        assert_eq!(meta.statement_type, StatementType::Quarterly);
        assert_eq!(meta.period, "2024-Q1");
        assert_eq!(meta.uploaded_by, "uid-42");
        assert_eq!(meta.source, "api");
    }

    #[test]
    fn test_metadata_unknown_statement_type_falls_back() {
        let (meta, rejected) =
            IntakeMetadata::from_object_metadata(&metadata(&[("statementType", "weekly")]));
        assert_eq!(meta.statement_type, StatementType::Monthly);
        assert_eq!(rejected, vec!["statementType=weekly".to_string()]);
    }

    #[test]
    fn test_present_empty_metadata_is_kept() {
        let (meta, rejected) = IntakeMetadata::from_object_metadata(&metadata(&[
            ("clientName", ""),
            ("uploadedBy", "  "),
            ("statementType", ""),
        ]));
        assert_eq!(meta.client_name, "");
        assert_eq!(meta.uploaded_by, "  ");
        assert_eq!(meta.source, DEFAULT_SOURCE);
        assert_eq!(meta.statement_type, StatementType::Monthly);
        assert_eq!(rejected, vec!["statementType=".to_string()]);
    }

    #[test]
    fn test_queued_job_has_null_placeholders() {
        let job = Job::queued(
            JobId::from_string("j1"),
            "bucket",
            "statements/a/original.pdf",
            IntakeMetadata::default(),
        );
        assert_eq!(job.status, JobStatus::Queued);
        assert!(job.parse_result_path.is_none());
        assert!(job.kpis.is_none());
        assert!(job.scenes.is_none());
        assert!(job.output_video_path.is_none());
        assert!(job.error.is_none());
    }

    #[test]
    fn test_job_lifecycle() {
        let mut job = Job::queued(
            JobId::from_string("j1"),
            "bucket",
            "statements/a/original.pdf",
            IntakeMetadata::default(),
        );
        job.advance(JobStatus::Parsing).unwrap();
        job.advance(JobStatus::Kpis).unwrap();
        job.advance(JobStatus::Scripting).unwrap();
        job.advance(JobStatus::Rendering).unwrap();
        job.complete("gs://bucket/videos/final.mp4").unwrap();
        assert!(job.is_terminal());
        assert!(job.error.is_none());
        assert!(job.fail("late").is_err());
    }

    #[test]
    fn test_fail_sets_error() {
        let mut job = Job::queued(
            JobId::from_string("j1"),
            "bucket",
            "statements/a/original.pdf",
            IntakeMetadata::default(),
        );
        job.advance(JobStatus::Parsing).unwrap();
        job.fail("parser crashed").unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("parser crashed"));
    }

    #[test]
    fn test_job_serializes_camel_case() {
        let job = Job::queued(
            JobId::from_string("j1"),
            "bucket",
            "statements/a/original.pdf",
            IntakeMetadata::default(),
        );
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["filePath"], "statements/a/original.pdf");
        assert_eq!(json["clientName"], "Unknown Client");
        assert_eq!(json["statementType"], "monthly");
        assert!(json["outputVideoPath"].is_null());
    }
}
