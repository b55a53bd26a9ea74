//! Job lifecycle states and the transition contract.
//!
//! Jobs move forward through the pipeline stages and never re-enter a
//! previous state. `Failed` can be reached from any non-terminal state.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pipeline status of a render job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Created by the ingestion trigger, waiting for a worker
    #[default]
    Queued,
    /// Source document is being parsed
    Parsing,
    /// KPIs are being extracted
    Kpis,
    /// Script and scenes are being generated
    Scripting,
    /// Scene clips are being rendered and stitched
    Rendering,
    /// Final video has been written
    Complete,
    /// Pipeline stopped with an error
    Failed,
}

impl JobStatus {
    /// All states in pipeline order.
    pub const ALL: [JobStatus; 7] = [
        JobStatus::Queued,
        JobStatus::Parsing,
        JobStatus::Kpis,
        JobStatus::Scripting,
        JobStatus::Rendering,
        JobStatus::Complete,
        JobStatus::Failed,
    ];

    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Parsing => "parsing",
            JobStatus::Kpis => "kpis",
            JobStatus::Scripting => "scripting",
            JobStatus::Rendering => "rendering",
            JobStatus::Complete => "complete",
            JobStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Failed)
    }

    /// The stage that follows this one on the success path.
    pub fn next(&self) -> Option<JobStatus> {
        match self {
            JobStatus::Queued => Some(JobStatus::Parsing),
            JobStatus::Parsing => Some(JobStatus::Kpis),
            JobStatus::Kpis => Some(JobStatus::Scripting),
            JobStatus::Scripting => Some(JobStatus::Rendering),
            JobStatus::Rendering => Some(JobStatus::Complete),
            JobStatus::Complete | JobStatus::Failed => None,
        }
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == JobStatus::Failed || self.next() == Some(next)
    }

    /// Validate a transition, returning a typed error when illegal.
    pub fn check_transition(&self, next: JobStatus) -> Result<(), TransitionError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(TransitionError {
                from: *self,
                to: next,
            })
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Rejected state change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal job transition: {from} -> {to}")]
pub struct TransitionError {
    pub from: JobStatus,
    pub to: JobStatus,
}

/// Status string not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown job status: {0}")]
pub struct UnknownStatus(pub String);
