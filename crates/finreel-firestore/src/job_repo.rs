//! Typed repository for render jobs.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{info, warn};

use finreel_models::{IntakeMetadata, Job, JobId, JobStatus, StatementType};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::store::{CreateOutcome, JobStore};
use crate::types::{Document, FromFirestoreValue, ToFirestoreValue, Value, Write};

/// Collection holding one document per job.
pub const JOBS_COLLECTION: &str = "renderJobs";

/// Repository for render job documents.
#[derive(Clone)]
pub struct JobRepository {
    client: FirestoreClient,
}

impl JobRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Get a job by ID.
    pub async fn get(&self, job_id: &JobId) -> FirestoreResult<Option<Job>> {
        Ok(self.get_versioned(job_id).await?.map(|(job, _)| job))
    }

    /// Create the job; `AlreadyExists` if a document with its id is present.
    pub async fn create_if_absent(&self, job: &Job) -> FirestoreResult<CreateOutcome> {
        let name = self.client.full_document_name(JOBS_COLLECTION, job.id.as_str());
        let fields = job_to_fields(job);

        let write = Write::update(Document::named(name, fields))
            .with_server_timestamps(&["createdAt", "updatedAt"])
            .if_absent();

        match self.client.commit(vec![write]).await {
            Ok(_) => {
                info!(job_id = %job.id, file_path = %job.file_path, "Created render job");
                Ok(CreateOutcome::Created)
            }
            Err(FirestoreError::AlreadyExists(_)) => Ok(CreateOutcome::AlreadyExists),
            Err(e) => Err(e),
        }
    }

    /// Move a job from `from` to `to`, writing `fields` alongside the status.
    ///
    /// The write is conditioned on the document's `updateTime`, so of two
    /// workers racing on the same transition exactly one succeeds; the other
    /// gets `PreconditionFailed`. `error` may only be written through [`fail`].
    ///
    /// [`fail`]: JobRepository::fail
    pub async fn advance(
        &self,
        job_id: &JobId,
        from: JobStatus,
        to: JobStatus,
        fields: HashMap<String, Value>,
    ) -> FirestoreResult<()> {
        if fields.contains_key("error") {
            return Err(FirestoreError::request_failed(
                "the error field is only written when failing a job",
            ));
        }
        self.transition(job_id, from, to, fields).await
    }

    /// Claim a job for a worker by moving it to the next stage.
    pub async fn claim(&self, job_id: &JobId, from: JobStatus, to: JobStatus, worker_id: &str) -> FirestoreResult<()> {
        let mut fields = HashMap::new();
        fields.insert("workerId".to_string(), worker_id.to_firestore_value());
        self.transition(job_id, from, to, fields).await?;
        info!(job_id = %job_id, worker_id, from = %from, to = %to, "Claimed job");
        Ok(())
    }

    /// Mark a job complete with its final video.
    pub async fn complete(&self, job_id: &JobId, from: JobStatus, output_video_path: &str) -> FirestoreResult<()> {
        let mut fields = HashMap::new();
        fields.insert("outputVideoPath".to_string(), output_video_path.to_firestore_value());
        self.transition(job_id, from, JobStatus::Complete, fields).await?;
        info!(job_id = %job_id, output_video_path, "Job complete");
        Ok(())
    }

    /// Mark a job failed with a reason.
    pub async fn fail(&self, job_id: &JobId, from: JobStatus, error: &str) -> FirestoreResult<()> {
        let mut fields = HashMap::new();
        fields.insert("error".to_string(), error.to_firestore_value());
        self.transition(job_id, from, JobStatus::Failed, fields).await?;
        warn!(job_id = %job_id, from = %from, error, "Job failed");
        Ok(())
    }

    async fn transition(
        &self,
        job_id: &JobId,
        from: JobStatus,
        to: JobStatus,
        mut fields: HashMap<String, Value>,
    ) -> FirestoreResult<()> {
        from.check_transition(to)?;

        let (job, update_time) = self
            .get_versioned(job_id)
            .await?
            .ok_or_else(|| FirestoreError::not_found(format!("{}/{}", JOBS_COLLECTION, job_id)))?;

        if job.status != from {
            return Err(FirestoreError::PreconditionFailed(format!(
                "job {} is {}, expected {}",
                job_id, job.status, from
            )));
        }

        fields.insert("status".to_string(), to.as_str().to_firestore_value());
        let mask: Vec<String> = fields.keys().cloned().collect();
        let name = self.client.full_document_name(JOBS_COLLECTION, job_id.as_str());

        let write = Write::update(Document::named(name, fields))
            .with_mask(mask)
            .with_server_timestamps(&["updatedAt"])
            .if_unchanged_since(update_time);

        self.client.commit(vec![write]).await?;
        Ok(())
    }

    /// Job plus the document's `updateTime`.
    async fn get_versioned(&self, job_id: &JobId) -> FirestoreResult<Option<(Job, String)>> {
        let Some(doc) = self.client.get_document(JOBS_COLLECTION, job_id.as_str()).await? else {
            return Ok(None);
        };

        let update_time = doc
            .update_time
            .clone()
            .ok_or_else(|| FirestoreError::InvalidResponse(format!("job {} has no updateTime", job_id)))?;

        Ok(Some((document_to_job(&doc, job_id)?, update_time)))
    }
}

#[async_trait]
impl JobStore for JobRepository {
    async fn create_if_absent(&self, job: &Job) -> FirestoreResult<CreateOutcome> {
        JobRepository::create_if_absent(self, job).await
    }

    async fn get(&self, id: &JobId) -> FirestoreResult<Option<Job>> {
        JobRepository::get(self, id).await
    }
}

fn job_to_fields(job: &Job) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    let mut put = |key: &str, value: Value| {
        fields.insert(key.to_string(), value);
    };

    put("status", job.status.as_str().to_firestore_value());
    put("filePath", job.file_path.to_firestore_value());
    put("bucket", job.bucket.to_firestore_value());
    put("clientName", job.metadata.client_name.to_firestore_value());
    put("statementType", job.metadata.statement_type.as_str().to_firestore_value());
    put("period", job.metadata.period.to_firestore_value());
    put("uploadedBy", job.metadata.uploaded_by.to_firestore_value());
    put("source", job.metadata.source.to_firestore_value());
    put("parseResultPath", job.parse_result_path.to_firestore_value());
    put("kpis", job.kpis.to_firestore_value());
    put("scenes", job.scenes.to_firestore_value());
    put("outputVideoPath", job.output_video_path.to_firestore_value());
    put("error", job.error.to_firestore_value());
    put("workerId", job.worker_id.to_firestore_value());

    fields
}

fn document_to_job(doc: &Document, job_id: &JobId) -> FirestoreResult<Job> {
    let fields = doc
        .fields
        .as_ref()
        .ok_or_else(|| FirestoreError::InvalidResponse("Document has no fields".to_string()))?;

    let get_opt = |key: &str| -> Option<String> { fields.get(key).and_then(String::from_firestore_value) };
    let get_string = |key: &str| -> String { get_opt(key).unwrap_or_default() };

    let status_raw = get_string("status");
    let status = status_raw
        .parse::<JobStatus>()
        .map_err(|e| FirestoreError::InvalidResponse(format!("job {}: {}", job_id, e)))?;

    let defaults = IntakeMetadata::default();
    let metadata = IntakeMetadata {
        client_name: get_opt("clientName").unwrap_or(defaults.client_name),
        statement_type: get_opt("statementType")
            .and_then(|s| StatementType::parse(&s))
            .unwrap_or_default(),
        period: get_string("period"),
        uploaded_by: get_opt("uploadedBy").unwrap_or(defaults.uploaded_by),
        source: get_opt("source").unwrap_or(defaults.source),
    };

    Ok(Job {
        id: job_id.clone(),
        status,
        file_path: get_string("filePath"),
        bucket: get_string("bucket"),
        metadata,
        parse_result_path: get_opt("parseResultPath"),
        kpis: doc.get("kpis"),
        scenes: doc.get("scenes"),
        output_video_path: get_opt("outputVideoPath"),
        error: get_opt("error"),
        worker_id: get_opt("workerId"),
        created_at: doc.get("createdAt"),
        updated_at: doc.get("updatedAt"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job() -> Job {
        let metadata = IntakeMetadata {
            client_name: "Acme Corp".to_string(),
            statement_type: StatementType::Quarterly,
            period: "2024-Q1".to_string(),
            ..IntakeMetadata::default()
        };
        Job::queued(
            JobId::for_object("bucket", "statements/acme/original.pdf", Some("1")),
            "bucket",
            "statements/acme/original.pdf",
            metadata,
        )
    }

    #[test]
    fn test_new_job_fields_have_null_placeholders() {
        let fields = job_to_fields(&sample_job());
        assert_eq!(fields["status"], Value::StringValue("queued".into()));
        assert_eq!(fields["statementType"], Value::StringValue("quarterly".into()));
        for key in ["parseResultPath", "kpis", "scenes", "outputVideoPath", "error", "workerId"] {
            assert!(fields[key].is_null(), "{} should be null", key);
        }
        assert!(!fields.contains_key("createdAt"));
    }

    #[test]
    fn test_document_round_trip() {
        let job = sample_job();
        let mut fields = job_to_fields(&job);
        fields.insert("createdAt".into(), Value::TimestampValue("2024-04-01T10:00:00Z".into()));
        let doc = Document::new(fields);

        let parsed = document_to_job(&doc, &job.id).unwrap();
        assert_eq!(parsed.status, JobStatus::Queued);
        assert_eq!(parsed.metadata, job.metadata);
        assert_eq!(parsed.file_path, job.file_path);
        assert!(parsed.kpis.is_none());
        assert!(parsed.created_at.is_some());
    }

    #[test]
    fn test_unknown_status_is_invalid() {
        let mut fields = job_to_fields(&sample_job());
        fields.insert("status".into(), Value::StringValue("exploded".into()));
        let err = document_to_job(&Document::new(fields), &sample_job().id).unwrap_err();
        assert!(matches!(err, FirestoreError::InvalidResponse(_)));
    }
}
