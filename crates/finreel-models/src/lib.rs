//! Shared data models for the FinReel rendering pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Render jobs and their status state machine
//! - Upload metadata and statement types
//! - Object storage paths
//! - Rendering service requests and responses
//! - Encoding profile

pub mod encoding;
pub mod job;
pub mod job_status;
pub mod object_path;
pub mod render;

// Re-export common types
pub use encoding::EncodingProfile;
pub use job::{IntakeMetadata, Job, JobId, StatementType};
pub use job_status::{JobStatus, TransitionError, UnknownStatus};
pub use object_path::{ObjectPath, PathError};
pub use render::{ConcatRequest, RenderResponse, SlateRequest};
