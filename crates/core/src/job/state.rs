//! The job record and its state machine.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tokio::sync::RwLock;

use super::error::JobError;
use super::events::{EventLog, EventStream};
use super::types::{JobId, JobSnapshot, JobState, ProgressEvent};

#[derive(Debug)]
struct JobRecord {
    state: JobState,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    item_count: Option<usize>,
    /// Set exactly when `state` is `Succeeded`.
    archive_path: Option<PathBuf>,
    error: Option<String>,
}

/// One submission: its lifecycle record plus its progress log.
///
/// Shared between the registry and the execution task; only the execution
/// task mutates it.
#[derive(Debug)]
pub struct Job {
    id: JobId,
    source_url: String,
    created_at: DateTime<Utc>,
    record: RwLock<JobRecord>,
    events: EventLog,
}

impl Job {
    pub fn new(id: JobId, source_url: impl Into<String>) -> Self {
        Self {
            id,
            source_url: source_url.into(),
            created_at: Utc::now(),
            record: RwLock::new(JobRecord {
                state: JobState::Pending,
                started_at: None,
                finished_at: None,
                item_count: None,
                archive_path: None,
                error: None,
            }),
            events: EventLog::new(),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub async fn state(&self) -> JobState {
        self.record.read().await.state
    }

    /// Archive location; `Some` only once the job has succeeded.
    pub async fn archive_path(&self) -> Option<PathBuf> {
        self.record.read().await.archive_path.clone()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn subscribe(&self) -> EventStream {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: ProgressEvent) -> Result<(), JobError> {
        self.events.append(event).map_err(JobError::from)
    }

    pub(crate) async fn set_item_count(&self, count: usize) {
        self.record.write().await.item_count = Some(count);
    }

    /// Pending -> Running.
    pub(crate) async fn mark_running(&self) -> Result<(), JobError> {
        let mut record = self.record.write().await;
        Self::transition(&mut record, JobState::Running)?;
        record.started_at = Some(Utc::now());
        Ok(())
    }

    /// Running -> Succeeded, recording where the archive lives.
    ///
    /// `event` is appended before the record lock is released, so no reader
    /// observes the terminal state ahead of the terminal event.
    pub(crate) async fn mark_succeeded(
        &self,
        archive_path: PathBuf,
        event: ProgressEvent,
    ) -> Result<(), JobError> {
        let mut record = self.record.write().await;
        Self::transition(&mut record, JobState::Succeeded)?;
        record.archive_path = Some(archive_path);
        record.finished_at = Some(Utc::now());
        self.emit(event)
    }

    /// Running -> Failed, appending `event` under the same lock.
    pub(crate) async fn mark_failed(
        &self,
        error: impl Into<String>,
        event: ProgressEvent,
    ) -> Result<(), JobError> {
        let mut record = self.record.write().await;
        Self::transition(&mut record, JobState::Failed)?;
        record.archive_path = None;
        record.error = Some(error.into());
        record.finished_at = Some(Utc::now());
        self.emit(event)
    }

    fn transition(record: &mut JobRecord, next: JobState) -> Result<(), JobError> {
        if !record.state.can_transition_to(next) {
            return Err(JobError::InvalidTransition {
                from: record.state,
                to: next,
            });
        }
        record.state = next;
        Ok(())
    }

    pub async fn snapshot(&self) -> JobSnapshot {
        let record = self.record.read().await;
        JobSnapshot {
            id: self.id,
            source_url: self.source_url.clone(),
            state: record.state,
            created_at: self.created_at,
            started_at: record.started_at,
            finished_at: record.finished_at,
            item_count: record.item_count,
            progress: self.events.last(),
            archive_ready: record.archive_path.is_some(),
            error: record.error.clone(),
        }
    }
}
