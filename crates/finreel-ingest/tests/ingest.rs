//! Ingestion behaviour against in-memory job and statement stores.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};
use tower::ServiceExt;

use finreel_firestore::{
    CreateOutcome, FirestoreError, FirestoreResult, JobStore, StatementRef, StatementStore,
};
use finreel_ingest::{create_router, IngestConfig, IngestFilter, IngestOutcome, Ingestor, StorageObjectEvent};
use finreel_models::{Job, JobId, JobStatus, StatementType};

// ============================================================================
// Fakes
// ============================================================================

#[derive(Default)]
struct MemoryJobs {
    jobs: Mutex<HashMap<JobId, Job>>,
    creates: Mutex<usize>,
    unavailable: bool,
}

impl MemoryJobs {
    fn all(&self) -> Vec<Job> {
        self.jobs.lock().unwrap().values().cloned().collect()
    }

    fn creates(&self) -> usize {
        *self.creates.lock().unwrap()
    }
}

#[async_trait]
impl JobStore for MemoryJobs {
    async fn create_if_absent(&self, job: &Job) -> FirestoreResult<CreateOutcome> {
        *self.creates.lock().unwrap() += 1;
        if self.unavailable {
            return Err(FirestoreError::from_http_status(503, "backend unavailable".to_string()));
        }
        let mut jobs = self.jobs.lock().unwrap();
        if jobs.contains_key(&job.id) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        jobs.insert(job.id.clone(), job.clone());
        Ok(CreateOutcome::Created)
    }

    async fn get(&self, id: &JobId) -> FirestoreResult<Option<Job>> {
        Ok(self.jobs.lock().unwrap().get(id).cloned())
    }
}

#[derive(Default)]
struct MemoryStatements {
    by_path: HashMap<String, String>,
    lookups: Mutex<Vec<String>>,
    linked: Mutex<Vec<String>>,
    fail_link: bool,
}

impl MemoryStatements {
    fn with(file_path: &str, id: &str) -> Self {
        Self {
            by_path: HashMap::from([(file_path.to_string(), id.to_string())]),
            ..Self::default()
        }
    }

    fn linked(&self) -> Vec<String> {
        self.linked.lock().unwrap().clone()
    }

    fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatementStore for MemoryStatements {
    async fn find_by_file_path(&self, file_path: &str) -> FirestoreResult<Option<StatementRef>> {
        self.lookups.lock().unwrap().push(file_path.to_string());
        Ok(self.by_path.get(file_path).map(|id| StatementRef { id: id.clone() }))
    }

    async fn mark_job_linked(&self, statement: &StatementRef) -> FirestoreResult<()> {
        if self.fail_link {
            return Err(FirestoreError::from_http_status(500, "internal".to_string()));
        }
        self.linked.lock().unwrap().push(statement.id.clone());
        Ok(())
    }
}

const FILE_PATH: &str = "statements/acme/2024-03/original.pdf";

fn statement_event(metadata: Value) -> StorageObjectEvent {
    serde_json::from_value(json!({
        "bucket": "uploads",
        "name": FILE_PATH,
        "contentType": "application/pdf",
        "generation": "1711929600000000",
        "metadata": metadata
    }))
    .unwrap()
}

fn ingestor(jobs: &Arc<MemoryJobs>, statements: &Arc<MemoryStatements>) -> Ingestor {
    Ingestor::new(jobs.clone(), statements.clone(), IngestFilter::default())
}

// ============================================================================
// Ingestor
// ============================================================================

#[tokio::test]
async fn test_non_matching_events_are_ignored() {
    let jobs = Arc::new(MemoryJobs::default());
    let statements = Arc::new(MemoryStatements::default());
    let ingestor = ingestor(&jobs, &statements);

    let events = [
        json!({"bucket": "uploads", "name": "videos/acme/original.pdf", "contentType": "application/pdf"}),
        json!({"bucket": "uploads", "name": "statements/acme/notes.pdf", "contentType": "application/pdf"}),
        json!({"bucket": "uploads", "name": FILE_PATH, "contentType": "image/jpeg"}),
        json!({"bucket": "uploads", "name": FILE_PATH}),
        json!({"bucket": "uploads"}),
    ];

    for event in events {
        let event: StorageObjectEvent = serde_json::from_value(event).unwrap();
        let report = ingestor.handle(&event).await.unwrap();
        assert_eq!(report.outcome, IngestOutcome::Ignored);
        assert!(report.job_id.is_none());
    }

    assert_eq!(jobs.creates(), 0);
    assert!(statements.lookups().is_empty());
}

#[tokio::test]
async fn test_matching_event_creates_one_queued_job_with_defaults() {
    let jobs = Arc::new(MemoryJobs::default());
    let statements = Arc::new(MemoryStatements::default());

    let event = statement_event(json!({}));
    let report = assert_ok!(ingestor(&jobs, &statements).handle(&event).await);

    assert_eq!(report.outcome, IngestOutcome::Created);
    assert_eq!(report.job_id, Some(event.job_id()));
    assert!(report.linked_statement.is_none());

    let all = jobs.all();
    assert_eq!(all.len(), 1);
    let job = &all[0];
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.file_path, FILE_PATH);
    assert_eq!(job.bucket, "uploads");
    assert_eq!(job.metadata.client_name, "Unknown Client");
    assert_eq!(job.metadata.statement_type, StatementType::Monthly);
    assert_eq!(job.metadata.period, "");
    assert_eq!(job.metadata.uploaded_by, "anon");
    assert_eq!(job.metadata.source, "ui");
    assert!(job.parse_result_path.is_none());
    assert!(job.kpis.is_none());
    assert!(job.scenes.is_none());
    assert!(job.output_video_path.is_none());
    assert!(job.error.is_none());

    // Lookup ran and found nothing; nothing was linked.
    assert_eq!(statements.lookups(), vec![FILE_PATH.to_string()]);
    assert!(statements.linked().is_empty());
}

#[tokio::test]
async fn test_metadata_is_carried_onto_the_job() {
    let jobs = Arc::new(MemoryJobs::default());
    let statements = Arc::new(MemoryStatements::default());

    let event = statement_event(json!({
        "clientName": "Acme Holdings",
        "statementType": "quarterly",
        "period": "2024-Q1",
        "uploadedBy": "uid-42",
        "source": "email"
    }));
    ingestor(&jobs, &statements).handle(&event).await.unwrap();

    let job = &jobs.all()[0];
    assert_eq!(job.metadata.client_name, "Acme Holdings");
    assert_eq!(job.metadata.statement_type, StatementType::Quarterly);
    assert_eq!(job.metadata.period, "2024-Q1");
    assert_eq!(job.metadata.uploaded_by, "uid-42");
    assert_eq!(job.metadata.source, "email");
}

#[tokio::test]
async fn test_unknown_statement_type_falls_back_to_monthly() {
    let jobs = Arc::new(MemoryJobs::default());
    let statements = Arc::new(MemoryStatements::default());

    let event = statement_event(json!({"statementType": "weekly"}));
    let report = ingestor(&jobs, &statements).handle(&event).await.unwrap();

    assert_eq!(report.outcome, IngestOutcome::Created);
    assert_eq!(jobs.all()[0].metadata.statement_type, StatementType::Monthly);
}

#[tokio::test]
async fn test_redelivery_does_not_create_second_job() {
    let jobs = Arc::new(MemoryJobs::default());
    let statements = Arc::new(MemoryStatements::with(FILE_PATH, "stmt-1"));
    let ingestor = ingestor(&jobs, &statements);
    let event = statement_event(json!({"clientName": "Acme"}));

    let first = ingestor.handle(&event).await.unwrap();
    let second = ingestor.handle(&event).await.unwrap();

    assert_eq!(first.outcome, IngestOutcome::Created);
    assert_eq!(second.outcome, IngestOutcome::Duplicate);
    assert_eq!(first.job_id, second.job_id);
    assert_eq!(jobs.all().len(), 1);

    // Linking is repeated; the update is idempotent.
    assert_eq!(statements.linked(), vec!["stmt-1".to_string(), "stmt-1".to_string()]);
}

#[tokio::test]
async fn test_new_generation_is_a_new_job() {
    let jobs = Arc::new(MemoryJobs::default());
    let statements = Arc::new(MemoryStatements::default());
    let ingestor = ingestor(&jobs, &statements);

    let mut event = statement_event(json!({}));
    ingestor.handle(&event).await.unwrap();
    event.generation = Some("1711929600000001".to_string());
    let report = ingestor.handle(&event).await.unwrap();

    assert_eq!(report.outcome, IngestOutcome::Created);
    assert_eq!(jobs.all().len(), 2);
}

#[tokio::test]
async fn test_matching_statement_is_linked() {
    let jobs = Arc::new(MemoryJobs::default());
    let statements = Arc::new(MemoryStatements::with(FILE_PATH, "stmt-9"));

    let report = ingestor(&jobs, &statements)
        .handle(&statement_event(json!({})))
        .await
        .unwrap();

    assert_eq!(report.linked_statement.as_deref(), Some("stmt-9"));
    assert_eq!(statements.linked(), vec!["stmt-9".to_string()]);
}

#[tokio::test]
async fn test_store_failure_propagates() {
    let jobs = Arc::new(MemoryJobs {
        unavailable: true,
        ..MemoryJobs::default()
    });
    let statements = Arc::new(MemoryStatements::with(FILE_PATH, "stmt-1"));

    let result = ingestor(&jobs, &statements).handle(&statement_event(json!({}))).await;

    assert_err!(result);
    assert!(statements.lookups().is_empty());
}

#[tokio::test]
async fn test_link_failure_propagates_after_create() {
    let jobs = Arc::new(MemoryJobs::default());
    let statements = Arc::new(MemoryStatements {
        fail_link: true,
        ..MemoryStatements::with(FILE_PATH, "stmt-1")
    });

    let result = ingestor(&jobs, &statements).handle(&statement_event(json!({}))).await;

    assert_err!(result);
    assert_eq!(jobs.all().len(), 1);
}

// ============================================================================
// HTTP receiver
// ============================================================================

async fn post(app: axum::Router, uri: &str, body: String) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .header("ce-id", "evt-1")
                .header("ce-type", "google.cloud.storage.object.v1.finalized")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn router(jobs: &Arc<MemoryJobs>, statements: &Arc<MemoryStatements>) -> axum::Router {
    router_with(jobs, statements, &IngestConfig::default())
}

fn router_with(jobs: &Arc<MemoryJobs>, statements: &Arc<MemoryStatements>, config: &IngestConfig) -> axum::Router {
    create_router(Arc::new(ingestor(jobs, statements)), config, None)
}

#[tokio::test]
async fn test_receiver_creates_job() {
    let jobs = Arc::new(MemoryJobs::default());
    let statements = Arc::new(MemoryStatements::default());
    let event = statement_event(json!({}));

    let (status, body) = post(router(&jobs, &statements), "/", serde_json::to_string(&event).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "created");
    assert_eq!(body["jobId"], event.job_id().as_str());
}

#[tokio::test]
async fn test_receiver_events_path_and_ignored_outcome() {
    let jobs = Arc::new(MemoryJobs::default());
    let statements = Arc::new(MemoryStatements::default());
    let body = json!({"bucket": "uploads", "name": "videos/final.mp4", "contentType": "video/mp4"});

    let (status, body) = post(router(&jobs, &statements), "/events", body.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"outcome": "ignored"}));
}

#[tokio::test]
async fn test_receiver_rejects_malformed_event() {
    let jobs = Arc::new(MemoryJobs::default());
    let statements = Arc::new(MemoryStatements::default());

    let (status, body) = post(router(&jobs, &statements), "/", "{\"bucket\": ".to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().starts_with("Malformed event"));
    assert_eq!(jobs.creates(), 0);
}

#[tokio::test]
async fn test_receiver_store_failure_is_server_error() {
    let jobs = Arc::new(MemoryJobs {
        unavailable: true,
        ..MemoryJobs::default()
    });
    let statements = Arc::new(MemoryStatements::default());
    let event = statement_event(json!({}));

    let (status, _) = post(router(&jobs, &statements), "/", serde_json::to_string(&event).unwrap()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_receiver_store_failure_detail_follows_environment() {
    let jobs = Arc::new(MemoryJobs {
        unavailable: true,
        ..MemoryJobs::default()
    });
    let statements = Arc::new(MemoryStatements::default());
    let event = serde_json::to_string(&statement_event(json!({}))).unwrap();

    let (_, body) = post(router(&jobs, &statements), "/", event.clone()).await;
    assert!(body["detail"].as_str().unwrap().contains("backend unavailable"));

    let production = IngestConfig {
        environment: "Production".to_string(),
        ..IngestConfig::default()
    };
    let (status, body) = post(router_with(&jobs, &statements, &production), "/", event).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"detail": "Internal server error"}));

    let (status, body) = post(router_with(&jobs, &statements, &production), "/", "{".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().starts_with("Malformed event"));
}

#[tokio::test]
async fn test_receiver_healthz() {
    let jobs = Arc::new(MemoryJobs::default());
    let statements = Arc::new(MemoryStatements::default());

    let response = router(&jobs, &statements)
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
