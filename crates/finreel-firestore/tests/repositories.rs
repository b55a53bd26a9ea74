//! Repository behaviour against a mocked Firestore REST endpoint.

use std::collections::HashMap;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use finreel_firestore::{
    CreateOutcome, FirestoreClient, FirestoreConfig, FirestoreError, JobRepository, StatementRef,
    StatementRepository,
};
use finreel_models::{IntakeMetadata, Job, JobId, JobStatus};

const DOCS: &str = "/v1/projects/demo/databases/(default)/documents";
const UPDATE_TIME: &str = "2024-04-01T10:00:00.123456Z";

async fn client(server: &MockServer) -> FirestoreClient {
    let config = FirestoreConfig::for_emulator("demo", server.address().to_string());
    FirestoreClient::new(config).await.unwrap()
}

fn job_id() -> JobId {
    JobId::from_string("job-1")
}

fn new_job() -> Job {
    Job::queued(job_id(), "uploads", "statements/acme/original.pdf", IntakeMetadata::default())
}

fn job_document(status: &str) -> serde_json::Value {
    json!({
        "name": "projects/demo/databases/(default)/documents/renderJobs/job-1",
        "fields": {
            "status": {"stringValue": status},
            "filePath": {"stringValue": "statements/acme/original.pdf"},
            "bucket": {"stringValue": "uploads"},
            "clientName": {"stringValue": "Acme"},
            "statementType": {"stringValue": "monthly"},
            "period": {"stringValue": ""},
            "error": {"nullValue": null},
            "createdAt": {"timestampValue": "2024-04-01T09:00:00Z"}
        },
        "createTime": "2024-04-01T09:00:00Z",
        "updateTime": UPDATE_TIME
    })
}

fn commit_ok() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "writeResults": [{"updateTime": "2024-04-01T10:00:01Z"}],
        "commitTime": "2024-04-01T10:00:01Z"
    }))
}

async fn mock_get_job(server: &MockServer, status: &str) {
    Mock::given(method("GET"))
        .and(path(format!("{}/renderJobs/job-1", DOCS)))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_document(status)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_create_uses_absent_precondition_and_server_timestamps() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}:commit", DOCS)))
        .and(body_partial_json(json!({
            "writes": [{
                "currentDocument": {"exists": false},
                "updateTransforms": [
                    {"fieldPath": "createdAt", "setToServerValue": "REQUEST_TIME"},
                    {"fieldPath": "updatedAt", "setToServerValue": "REQUEST_TIME"}
                ],
                "update": {
                    "name": "projects/demo/databases/(default)/documents/renderJobs/job-1",
                    "fields": {"status": {"stringValue": "queued"}}
                }
            }]
        })))
        .respond_with(commit_ok())
        .expect(1)
        .mount(&server)
        .await;

    let repo = JobRepository::new(client(&server).await);
    let outcome = repo.create_if_absent(&new_job()).await.unwrap();
    assert_eq!(outcome, CreateOutcome::Created);
}

#[tokio::test]
async fn test_create_existing_job_reports_already_exists() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}:commit", DOCS)))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": {"code": 409, "message": "Document already exists", "status": "ALREADY_EXISTS"}
        })))
        .mount(&server)
        .await;

    let repo = JobRepository::new(client(&server).await);
    let outcome = repo.create_if_absent(&new_job()).await.unwrap();
    assert_eq!(outcome, CreateOutcome::AlreadyExists);
}

#[tokio::test]
async fn test_create_is_sent_once_when_backend_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}:commit", DOCS)))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": {"code": 503, "message": "The service is currently unavailable.", "status": "UNAVAILABLE"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let repo = JobRepository::new(client(&server).await);
    let err = repo.create_if_absent(&new_job()).await.unwrap_err();
    assert!(matches!(err, FirestoreError::ServerError(503, _)), "{:?}", err);
}

#[tokio::test]
async fn test_statement_calls_are_sent_once_on_failure() {
    let server = MockServer::start().await;
    for endpoint in [":runQuery", ":commit"] {
        Mock::given(method("POST"))
            .and(path(format!("{}{}", DOCS, endpoint)))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
            .expect(1)
            .mount(&server)
            .await;
    }

    let repo = StatementRepository::new(client(&server).await);
    assert!(repo.find_by_file_path("statements/acme/original.pdf").await.is_err());
    assert!(repo
        .mark_job_linked(&StatementRef { id: "stmt-9".to_string() })
        .await
        .is_err());
}

#[tokio::test]
async fn test_get_missing_job() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/renderJobs/job-1", DOCS)))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": {"status": "NOT_FOUND"}})))
        .mount(&server)
        .await;

    let repo = JobRepository::new(client(&server).await);
    assert!(repo.get(&job_id()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_claim_writes_with_update_time_precondition() {
    let server = MockServer::start().await;
    mock_get_job(&server, "queued").await;
    Mock::given(method("POST"))
        .and(path(format!("{}:commit", DOCS)))
        .and(body_partial_json(json!({
            "writes": [{
                "currentDocument": {"updateTime": UPDATE_TIME},
                "update": {"fields": {
                    "status": {"stringValue": "parsing"},
                    "workerId": {"stringValue": "worker-a"}
                }},
                "updateTransforms": [{"fieldPath": "updatedAt", "setToServerValue": "REQUEST_TIME"}]
            }]
        })))
        .respond_with(commit_ok())
        .expect(1)
        .mount(&server)
        .await;

    let repo = JobRepository::new(client(&server).await);
    repo.claim(&job_id(), JobStatus::Queued, JobStatus::Parsing, "worker-a")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_lost_race_is_precondition_failed() {
    let server = MockServer::start().await;
    mock_get_job(&server, "queued").await;
    Mock::given(method("POST"))
        .and(path(format!("{}:commit", DOCS)))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "the stored version does not match", "status": "FAILED_PRECONDITION"}
        })))
        .mount(&server)
        .await;

    let repo = JobRepository::new(client(&server).await);
    let err = repo
        .claim(&job_id(), JobStatus::Queued, JobStatus::Parsing, "worker-b")
        .await
        .unwrap_err();
    assert!(err.is_precondition_failed(), "{:?}", err);
}

#[tokio::test]
async fn test_status_mismatch_does_not_write() {
    let server = MockServer::start().await;
    mock_get_job(&server, "parsing").await;
    Mock::given(method("POST"))
        .and(path(format!("{}:commit", DOCS)))
        .respond_with(commit_ok())
        .expect(0)
        .mount(&server)
        .await;

    let repo = JobRepository::new(client(&server).await);
    let err = repo
        .advance(&job_id(), JobStatus::Queued, JobStatus::Parsing, HashMap::new())
        .await
        .unwrap_err();
    assert!(err.is_precondition_failed());
}

#[tokio::test]
async fn test_illegal_transition_rejected_before_io() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_document("queued")))
        .expect(0)
        .mount(&server)
        .await;

    let repo = JobRepository::new(client(&server).await);
    let err = repo
        .advance(&job_id(), JobStatus::Queued, JobStatus::Rendering, HashMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FirestoreError::InvalidTransition(_)));

    let err = repo
        .complete(&job_id(), JobStatus::Failed, "gs://out/final.mp4")
        .await
        .unwrap_err();
    assert!(matches!(err, FirestoreError::InvalidTransition(_)));
}

#[tokio::test]
async fn test_fail_records_error() {
    let server = MockServer::start().await;
    mock_get_job(&server, "rendering").await;
    Mock::given(method("POST"))
        .and(path(format!("{}:commit", DOCS)))
        .and(body_partial_json(json!({
            "writes": [{"update": {"fields": {
                "status": {"stringValue": "failed"},
                "error": {"stringValue": "encoder timed out"}
            }}}]
        })))
        .respond_with(commit_ok())
        .expect(1)
        .mount(&server)
        .await;

    let repo = JobRepository::new(client(&server).await);
    repo.fail(&job_id(), JobStatus::Rendering, "encoder timed out")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_find_statement_by_file_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}:runQuery", DOCS)))
        .and(body_partial_json(json!({
            "structuredQuery": {
                "from": [{"collectionId": "statements"}],
                "where": {"fieldFilter": {
                    "field": {"fieldPath": "filePath"},
                    "op": "EQUAL",
                    "value": {"stringValue": "statements/acme/original.pdf"}
                }},
                "limit": 1
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "document": {
                "name": "projects/demo/databases/(default)/documents/statements/stmt-9",
                "fields": {"filePath": {"stringValue": "statements/acme/original.pdf"}},
                "updateTime": UPDATE_TIME
            },
            "readTime": UPDATE_TIME
        }])))
        .mount(&server)
        .await;

    let repo = StatementRepository::new(client(&server).await);
    let found = repo
        .find_by_file_path("statements/acme/original.pdf")
        .await
        .unwrap();
    assert_eq!(found, Some(StatementRef { id: "stmt-9".to_string() }));
}

#[tokio::test]
async fn test_find_statement_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}:runQuery", DOCS)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"readTime": UPDATE_TIME}])))
        .mount(&server)
        .await;

    let repo = StatementRepository::new(client(&server).await);
    assert!(repo.find_by_file_path("statements/x/original.pdf").await.unwrap().is_none());
}

#[tokio::test]
async fn test_mark_job_linked_only_touches_status_and_timestamps() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}:commit", DOCS)))
        .and(body_partial_json(json!({
            "writes": [{
                "update": {
                    "name": "projects/demo/databases/(default)/documents/statements/stmt-9",
                    "fields": {"status": {"stringValue": "queued"}}
                },
                "updateMask": {"fieldPaths": ["status"]},
                "updateTransforms": [
                    {"fieldPath": "jobLinkedAt", "setToServerValue": "REQUEST_TIME"},
                    {"fieldPath": "updatedAt", "setToServerValue": "REQUEST_TIME"}
                ],
                "currentDocument": {"exists": true}
            }]
        })))
        .respond_with(commit_ok())
        .expect(1)
        .mount(&server)
        .await;

    let repo = StatementRepository::new(client(&server).await);
    repo.mark_job_linked(&StatementRef { id: "stmt-9".to_string() })
        .await
        .unwrap();
}
