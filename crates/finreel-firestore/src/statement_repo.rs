//! Statement records written by the upload UI.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{debug, info};

use finreel_models::JobStatus;

use crate::client::FirestoreClient;
use crate::error::FirestoreResult;
use crate::store::{StatementRef, StatementStore};
use crate::types::{Document, StructuredQuery, ToFirestoreValue, Write};

/// Collection of uploaded statements.
pub const STATEMENTS_COLLECTION: &str = "statements";

#[derive(Clone)]
pub struct StatementRepository {
    client: FirestoreClient,
}

impl StatementRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Find the statement uploaded to `file_path`.
    pub async fn find_by_file_path(&self, file_path: &str) -> FirestoreResult<Option<StatementRef>> {
        let query = StructuredQuery::field_equals(STATEMENTS_COLLECTION, "filePath", file_path.to_firestore_value())
            .with_limit(1);
        let docs = self.client.run_query("", query).await?;

        let found = docs.first().and_then(Document::id).map(|id| StatementRef { id: id.to_string() });
        if found.is_none() {
            debug!(file_path, "No statement record for upload");
        }
        Ok(found)
    }

    /// Flag the statement as queued for rendering.
    pub async fn mark_job_linked(&self, statement: &StatementRef) -> FirestoreResult<()> {
        let name = self.client.full_document_name(STATEMENTS_COLLECTION, &statement.id);

        let mut fields = HashMap::new();
        fields.insert("status".to_string(), JobStatus::Queued.as_str().to_firestore_value());
        let write = Write::update(Document::named(name, fields))
            .with_mask(["status"])
            .with_server_timestamps(&["jobLinkedAt", "updatedAt"])
            .if_exists();
        self.client.commit(vec![write]).await?;

        info!(statement_id = %statement.id, "Linked statement to render job");
        Ok(())
    }
}

#[async_trait]
impl StatementStore for StatementRepository {
    async fn find_by_file_path(&self, file_path: &str) -> FirestoreResult<Option<StatementRef>> {
        StatementRepository::find_by_file_path(self, file_path).await
    }

    async fn mark_job_linked(&self, statement: &StatementRef) -> FirestoreResult<()> {
        StatementRepository::mark_job_linked(self, statement).await
    }
}
