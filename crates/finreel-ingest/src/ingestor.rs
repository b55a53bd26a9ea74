//! Turns statement uploads into queued render jobs.
//!
//! Event delivery is at-least-once. The job id is derived from the object's
//! bucket, name and generation and written with a create-if-absent
//! precondition, so a redelivered event finds its job instead of making a
//! second one. Statement linking is an idempotent update and runs on every
//! accepted delivery.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use finreel_firestore::{CreateOutcome, JobStore, StatementStore};
use finreel_models::{IntakeMetadata, Job, JobId};

use crate::error::IngestResult;
use crate::event::StorageObjectEvent;
use crate::filter::IngestFilter;
use crate::metrics;

/// What happened to one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestOutcome {
    /// Not a statement upload
    Ignored,
    Created,
    /// The job for this object already existed
    Duplicate,
}

impl IngestOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestOutcome::Ignored => "ignored",
            IngestOutcome::Created => "created",
            IngestOutcome::Duplicate => "duplicate",
        }
    }
}

/// Result of ingesting one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub outcome: IngestOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    /// Statement record pointed at the job, if one matched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_statement: Option<String>,
}

impl IngestReport {
    fn ignored() -> Self {
        Self {
            outcome: IngestOutcome::Ignored,
            job_id: None,
            linked_statement: None,
        }
    }
}

/// Handles storage events against the job and statement stores.
pub struct Ingestor {
    jobs: Arc<dyn JobStore>,
    statements: Arc<dyn StatementStore>,
    filter: IngestFilter,
}

impl Ingestor {
    pub fn new(jobs: Arc<dyn JobStore>, statements: Arc<dyn StatementStore>, filter: IngestFilter) -> Self {
        Self {
            jobs,
            statements,
            filter,
        }
    }

    /// Ingest one finalized upload.
    pub async fn handle(&self, event: &StorageObjectEvent) -> IngestResult<IngestReport> {
        if let Some(reason) = self.filter.rejection(event) {
            debug!(name = %event.name, reason, "Ignoring storage event");
            metrics::record_event(IngestOutcome::Ignored.as_str());
            return Ok(IngestReport::ignored());
        }

        let result = self.ingest(event).await;
        match &result {
            Ok(report) => metrics::record_event(report.outcome.as_str()),
            Err(_) => metrics::record_event("error"),
        }
        result
    }

    async fn ingest(&self, event: &StorageObjectEvent) -> IngestResult<IngestReport> {
        let job_id = event.job_id();

        let (metadata, rejected) = IntakeMetadata::from_object_metadata(&event.metadata());
        for value in rejected {
            warn!(job_id = %job_id, value = %value, "Unrecognized upload metadata, using default");
        }

        let job = Job::queued(job_id.clone(), &event.bucket, &event.name, metadata);
        let outcome = match self.jobs.create_if_absent(&job).await? {
            CreateOutcome::Created => {
                info!(
                    job_id = %job_id,
                    file_path = %event.name,
                    client = %job.metadata.client_name,
                    statement_type = %job.metadata.statement_type,
                    "Created render job"
                );
                IngestOutcome::Created
            }
            CreateOutcome::AlreadyExists => {
                info!(job_id = %job_id, file_path = %event.name, "Render job already exists");
                IngestOutcome::Duplicate
            }
        };

        let linked_statement = self.link_statement(&job_id, &event.name).await?;

        Ok(IngestReport {
            outcome,
            job_id: Some(job_id),
            linked_statement,
        })
    }

    async fn link_statement(&self, job_id: &JobId, file_path: &str) -> IngestResult<Option<String>> {
        let Some(statement) = self.statements.find_by_file_path(file_path).await? else {
            debug!(job_id = %job_id, file_path, "No statement record to link");
            return Ok(None);
        };

        self.statements.mark_job_linked(&statement).await?;
        info!(job_id = %job_id, statement_id = %statement.id, "Linked statement to render job");
        Ok(Some(statement.id))
    }
}
