//! Storage upload trigger.
//!
//! Receives finalized-object events, filters them down to statement PDFs and
//! records a queued render job for each, pointing any matching statement
//! record at it.

pub mod config;
pub mod error;
pub mod event;
pub mod filter;
pub mod handlers;
pub mod ingestor;
pub mod metrics;
pub mod routes;

pub use config::IngestConfig;
pub use error::{IngestError, IngestResult};
pub use event::StorageObjectEvent;
pub use filter::IngestFilter;
pub use ingestor::{IngestOutcome, IngestReport, Ingestor};
pub use routes::create_router;
