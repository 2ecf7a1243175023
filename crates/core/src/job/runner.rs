//! Job execution: resolve, fetch each member, package the archive.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::archive::{ArchiveSummary, ArchiveWriter};
use crate::fetcher::{FetchOutcome, Fetcher};
use crate::metrics::{ITEMS_FETCHED, ITEMS_PER_JOB, JOBS_FINISHED, JOBS_RUNNING, JOB_DURATION};
use crate::resolver::Resolver;

use super::error::JobError;
use super::state::Job;
use super::types::{JobId, ProgressEvent};

/// File name of the archive inside a job's directory.
pub const ARCHIVE_FILE_NAME: &str = "transcripts.zip";

/// Percent reported once members are resolved.
const FOUND_PERCENT: u8 = 5;

/// Span of percent covered by per-item progress.
const ITEMS_PERCENT_SPAN: usize = 90;

/// Percent reported before fetching item `index` (1-based) of `total`.
pub fn item_percent(index: usize, total: usize) -> u8 {
    let scaled = index.min(total) * ITEMS_PERCENT_SPAN / total.max(1);
    FOUND_PERCENT + scaled as u8
}

/// Directory that holds everything written for one job.
pub fn job_dir(archive_dir: &Path, job_id: JobId) -> PathBuf {
    archive_dir.join(job_id.to_string())
}

/// Outcome of a successful execution.
struct Execution {
    summary: ArchiveSummary,
    message: &'static str,
}

/// Drives a job through its pipeline.
pub(crate) struct JobRunner {
    resolver: Arc<dyn Resolver>,
    fetcher: Arc<dyn Fetcher>,
    archive_dir: PathBuf,
}

impl JobRunner {
    pub(crate) fn new(
        resolver: Arc<dyn Resolver>,
        fetcher: Arc<dyn Fetcher>,
        archive_dir: PathBuf,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            archive_dir,
        }
    }

    pub(crate) fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }

    /// Execute `job` to a terminal state.
    pub(crate) async fn run(&self, job: Arc<Job>) {
        let job_id = job.id();
        if let Err(e) = job.mark_running().await {
            error!(%job_id, error = %e, "Job could not be started");
            return;
        }

        let started = Instant::now();
        JOBS_RUNNING.inc();
        info!(%job_id, source_url = job.source_url(), "Job started");

        let result = self.execute(&job).await;
        JOBS_RUNNING.dec();
        let elapsed = started.elapsed().as_secs_f64();

        match result {
            Ok(execution) => {
                if let Err(e) = self.finish_success(&job, execution).await {
                    error!(%job_id, error = %e, "Failed to record job success");
                }
                JOBS_FINISHED.with_label_values(&["succeeded"]).inc();
                JOB_DURATION
                    .with_label_values(&["succeeded"])
                    .observe(elapsed);
            }
            Err(e) => {
                error!(%job_id, error = %e, "Job failed");
                self.remove_job_dir(job_id).await;
                if let Err(record_err) = Self::finish_failure(&job, &e).await {
                    error!(%job_id, error = %record_err, "Failed to record job failure");
                }
                JOBS_FINISHED.with_label_values(&["failed"]).inc();
                JOB_DURATION.with_label_values(&["failed"]).observe(elapsed);
            }
        }
    }

    async fn execute(&self, job: &Job) -> Result<Execution, JobError> {
        let job_id = job.id();
        job.emit(ProgressEvent::progress(0, "Job started"))?;

        let members = self.resolve_members(job.source_url()).await;
        let total = members.len();
        job.set_item_count(total).await;
        ITEMS_PER_JOB.with_label_values(&[]).observe(total as f64);

        let archive_path = job_dir(&self.archive_dir, job_id).join(ARCHIVE_FILE_NAME);
        let mut writer = ArchiveWriter::create(archive_path).await?;

        if members.is_empty() {
            info!(%job_id, "No items found");
            return Ok(Execution {
                summary: writer.finish().await?,
                message: "No items found",
            });
        }

        info!(%job_id, items = total, "Resolved playlist");
        job.emit(ProgressEvent::progress(
            FOUND_PERCENT,
            format!("Found {total} items"),
        ))?;

        for (index, member_id) in members.iter().enumerate() {
            let position = index + 1;
            job.emit(ProgressEvent::progress(
                item_percent(position, total),
                format!("Processing {position}/{total}"),
            ))?;

            let outcome = self.fetch_member(member_id).await;
            ITEMS_FETCHED.with_label_values(&[outcome.label()]).inc();
            if let FetchOutcome::Error(detail) = &outcome {
                warn!(%job_id, member_id = member_id.as_str(), detail = detail.as_str(), "Item fetch failed");
            } else {
                debug!(%job_id, member_id = member_id.as_str(), outcome = outcome.label(), "Item fetched");
            }

            writer.add_entry(member_id.as_str(), outcome.render()).await?;
        }

        Ok(Execution {
            summary: writer.finish().await?,
            message: "Complete",
        })
    }

    /// Run the resolver; any failure counts as an empty collection.
    async fn resolve_members(&self, source_url: &str) -> Vec<String> {
        match AssertUnwindSafe(self.resolver.resolve(source_url))
            .catch_unwind()
            .await
        {
            Ok(Ok(members)) => members,
            Ok(Err(e)) => {
                warn!(resolver = self.resolver.name(), error = %e, "Resolution failed, treating as empty");
                Vec::new()
            }
            Err(panic) => {
                warn!(
                    resolver = self.resolver.name(),
                    panic = panic_message(panic.as_ref()),
                    "Resolver panicked, treating as empty"
                );
                Vec::new()
            }
        }
    }

    /// Run the fetcher; a panicking fetcher is recorded like any other error.
    async fn fetch_member(&self, member_id: &str) -> FetchOutcome {
        AssertUnwindSafe(self.fetcher.fetch(member_id))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| FetchOutcome::Error(panic_message(panic.as_ref()).to_string()))
    }

    async fn finish_success(&self, job: &Job, execution: Execution) -> Result<(), JobError> {
        let Execution { summary, message } = execution;
        info!(
            job_id = %job.id(),
            entries = summary.entries,
            size_bytes = summary.size_bytes,
            "Job complete"
        );
        job.mark_succeeded(summary.path, ProgressEvent::complete(message))
            .await
    }

    async fn finish_failure(job: &Job, cause: &JobError) -> Result<(), JobError> {
        job.mark_failed(cause.to_string(), ProgressEvent::failed(cause))
            .await
    }

    async fn remove_job_dir(&self, job_id: JobId) {
        let dir = job_dir(&self.archive_dir, job_id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => debug!(%job_id, path = %dir.display(), "Removed partial archive"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(%job_id, path = %dir.display(), error = %e, "Failed to remove job directory"),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("panic")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_percent_formula() {
        assert_eq!(item_percent(1, 3), 35);
        assert_eq!(item_percent(2, 3), 65);
        assert_eq!(item_percent(3, 3), 95);
        assert_eq!(item_percent(1, 1), 95);
        assert_eq!(item_percent(1, 7), 17); // 5 + floor(90 / 7)
    }

    #[test]
    fn test_item_percent_is_monotonic_and_bounded() {
        let total = 250;
        let mut last = FOUND_PERCENT;
        for i in 1..=total {
            let p = item_percent(i, total);
            assert!(p >= last);
            assert!(p <= 95);
            last = p;
        }
        assert_eq!(last, 95);
    }

    #[test]
    fn test_job_dir_is_scoped_by_id() {
        let a = JobId::new();
        let b = JobId::new();
        let base = Path::new("/var/lib/transcriptor");
        assert_ne!(job_dir(base, a), job_dir(base, b));
        assert!(job_dir(base, a).ends_with(a.to_string()));
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(boxed.as_ref()), "static message");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(42);
        assert_eq!(panic_message(boxed.as_ref()), "panic");
    }
}
