//! Error types for the job module.

use std::path::PathBuf;
use thiserror::Error;

use super::events::EventLogError;
use super::types::{JobId, JobState};
use crate::archive::ArchiveError;

/// Errors reported by the job registry and execution engine.
#[derive(Debug, Error)]
pub enum JobError {
    /// The submitted source URL is missing or unusable.
    #[error("{0}")]
    InvalidSource(String),

    /// No job with this ID is registered.
    #[error("Job not found: {0}")]
    NotFound(String),

    /// The job has not produced an archive (yet, or ever).
    #[error("Archive for job {job_id} is not ready (state: {state})")]
    NotReady { job_id: JobId, state: JobState },

    /// The job is still pending or running.
    #[error("Job {job_id} is still {state}")]
    Active { job_id: JobId, state: JobState },

    /// Illegal state machine transition.
    #[error("Invalid job transition from {from} to {to}")]
    InvalidTransition { from: JobState, to: JobState },

    /// The finished archive could not be read back.
    #[error("Failed to read archive {}: {source}", path.display())]
    ArchiveUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Archive creation failed during execution.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Progress could not be recorded.
    #[error(transparent)]
    Events(#[from] EventLogError),
}

impl JobError {
    /// Whether the error was caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidSource(_) | Self::NotFound(_) | Self::NotReady { .. } | Self::Active { .. }
        )
    }
}
