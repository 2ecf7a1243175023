//! Process-wide job table.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{RwLock, Semaphore};
use tracing::{debug, info, warn};

use crate::archive::ARCHIVE_CONTENT_TYPE;
use crate::fetcher::Fetcher;
use crate::metrics::JOBS_SUBMITTED;
use crate::resolver::Resolver;

use super::error::JobError;
use super::events::EventStream;
use super::runner::{job_dir, JobRunner};
use super::state::Job;
use super::types::{JobId, JobSnapshot, JobState};

/// Default number of jobs executing at once.
const DEFAULT_MAX_CONCURRENT: usize = 4;

/// A finished archive ready to hand to a caller.
#[derive(Debug, Clone)]
pub struct ArchiveArtifact {
    pub job_id: JobId,
    /// Suggested download file name.
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Owns every job for the lifetime of the process (until reaped).
///
/// Submission registers the job before its execution is spawned, so a
/// lookup never sees a partially constructed job.
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, Arc<Job>>>,
    runner: Arc<JobRunner>,
    permits: Arc<Semaphore>,
}

impl JobRegistry {
    /// Create a registry writing archives under `archive_dir`.
    pub fn new(
        resolver: Arc<dyn Resolver>,
        fetcher: Arc<dyn Fetcher>,
        archive_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            runner: Arc::new(JobRunner::new(resolver, fetcher, archive_dir.into())),
            permits: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENT)),
        }
    }

    /// Limit how many jobs execute at once; the rest wait in `pending`.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.permits = Arc::new(Semaphore::new(max_concurrent.max(1)));
        self
    }

    /// Register a job for `source_url` and start it in the background.
    ///
    /// Returns as soon as the job is registered.
    pub async fn submit(&self, source_url: &str) -> Result<JobId, JobError> {
        let source_url = validate_source_url(source_url)?;

        let job = {
            let mut jobs = self.jobs.write().await;
            loop {
                let id = JobId::new();
                if let Entry::Vacant(slot) = jobs.entry(id) {
                    let job = Arc::new(Job::new(id, source_url.clone()));
                    slot.insert(Arc::clone(&job));
                    break job;
                }
            }
        };

        let job_id = job.id();
        JOBS_SUBMITTED.inc();
        info!(%job_id, source_url = source_url.as_str(), "Job submitted");

        let runner = Arc::clone(&self.runner);
        let permits = Arc::clone(&self.permits);
        tokio::spawn(async move {
            // The semaphore is never closed, so acquisition only waits.
            let _permit = permits.acquire_owned().await.ok();
            runner.run(job).await;
        });

        Ok(job_id)
    }

    async fn job(&self, job_id: JobId) -> Result<Arc<Job>, JobError> {
        self.jobs
            .read()
            .await
            .get(&job_id)
            .cloned()
            .ok_or_else(|| JobError::NotFound(job_id.to_string()))
    }

    /// Current view of a job.
    pub async fn get(&self, job_id: JobId) -> Result<JobSnapshot, JobError> {
        Ok(self.job(job_id).await?.snapshot().await)
    }

    /// All registered jobs, oldest first.
    pub async fn list(&self) -> Vec<JobSnapshot> {
        let jobs: Vec<Arc<Job>> = self.jobs.read().await.values().cloned().collect();
        let mut snapshots = Vec::with_capacity(jobs.len());
        for job in jobs {
            snapshots.push(job.snapshot().await);
        }
        snapshots.sort_by_key(|s| s.created_at);
        snapshots
    }

    /// Number of registered jobs.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Subscribe to a job's progress from the first event.
    pub async fn subscribe(&self, job_id: JobId) -> Result<EventStream, JobError> {
        Ok(self.job(job_id).await?.subscribe())
    }

    /// Read the finished archive of a succeeded job.
    ///
    /// Safe to call repeatedly; the archive is never modified once written.
    pub async fn retrieve(&self, job_id: JobId) -> Result<ArchiveArtifact, JobError> {
        let job = self.job(job_id).await?;
        let Some(path) = job.archive_path().await else {
            let state = job.state().await;
            debug!(%job_id, %state, "Archive requested before it is ready");
            return Err(JobError::NotReady { job_id, state });
        };

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| JobError::ArchiveUnreadable {
                path: path.clone(),
                source,
            })?;

        Ok(ArchiveArtifact {
            job_id,
            file_name: format!("transcripts-{job_id}.zip"),
            content_type: ARCHIVE_CONTENT_TYPE,
            bytes,
        })
    }

    /// Forget a finished job and delete its archive.
    ///
    /// Jobs still pending or running cannot be removed. Open subscriptions
    /// end once the job is dropped.
    pub async fn remove(&self, job_id: JobId) -> Result<(), JobError> {
        {
            let mut jobs = self.jobs.write().await;
            let job = jobs
                .get(&job_id)
                .ok_or_else(|| JobError::NotFound(job_id.to_string()))?;
            let state = job.state().await;
            if !state.is_terminal() {
                return Err(JobError::Active { job_id, state });
            }
            jobs.remove(&job_id);
        }

        let dir = job_dir(self.runner.archive_dir(), job_id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(%job_id, path = %dir.display(), error = %e, "Failed to delete archive"),
        }
        info!(%job_id, "Job removed");
        Ok(())
    }

    /// Count of jobs per state.
    pub async fn state_counts(&self) -> HashMap<JobState, usize> {
        let jobs: Vec<Arc<Job>> = self.jobs.read().await.values().cloned().collect();
        let mut counts = HashMap::new();
        for job in jobs {
            *counts.entry(job.state().await).or_insert(0) += 1;
        }
        counts
    }
}

/// Trim and check a submitted source URL.
fn validate_source_url(source_url: &str) -> Result<String, JobError> {
    let trimmed = source_url.trim();
    if trimmed.is_empty() {
        return Err(JobError::InvalidSource("Missing playlist_url".to_string()));
    }

    let url = reqwest::Url::parse(trimmed)
        .map_err(|e| JobError::InvalidSource(format!("Invalid playlist_url: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(JobError::InvalidSource(format!(
            "Invalid playlist_url: unsupported scheme '{}'",
            url.scheme()
        )));
    }

    Ok(trimmed.to_string())
}
