//! Firestore REST client for render jobs and statements.
//!
//! This crate provides:
//! - A REST client with token caching and emulator support
//! - Atomic commits with preconditions and server timestamps
//! - The `renderJobs` repository enforcing the job state machine
//! - Statement lookup and linking

pub mod client;
pub mod error;
pub mod job_repo;
pub mod metrics;
pub mod statement_repo;
pub mod store;
pub mod token_cache;
pub mod types;

pub use client::{FirestoreClient, FirestoreConfig};
pub use error::{FirestoreError, FirestoreResult};
pub use job_repo::{JobRepository, JOBS_COLLECTION};
pub use statement_repo::{StatementRepository, STATEMENTS_COLLECTION};
pub use store::{CreateOutcome, JobStore, StatementRef, StatementStore};
pub use types::{Document, ToFirestoreValue, Value};
