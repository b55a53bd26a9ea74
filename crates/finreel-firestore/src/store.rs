//! Persistence seams used by the ingestion trigger.

use async_trait::async_trait;
use finreel_models::{Job, JobId};

use crate::error::FirestoreResult;

/// Result of a create-if-absent write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

/// Reference to a statement record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementRef {
    pub id: String,
}

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Create the job unless a document with its id already exists.
    async fn create_if_absent(&self, job: &Job) -> FirestoreResult<CreateOutcome>;

    async fn get(&self, id: &JobId) -> FirestoreResult<Option<Job>>;
}

#[async_trait]
pub trait StatementStore: Send + Sync {
    /// The statement whose `filePath` matches exactly, if any.
    async fn find_by_file_path(&self, file_path: &str) -> FirestoreResult<Option<StatementRef>>;

    /// Mark the statement queued and stamp `jobLinkedAt`.
    async fn mark_job_linked(&self, statement: &StatementRef) -> FirestoreResult<()>;
}
