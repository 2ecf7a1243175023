//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Job lifecycle (submissions, outcomes, durations)
//! - Per-item fetch outcomes
//! - Resolver strategy results

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Jobs
// =============================================================================

/// Jobs submitted total.
pub static JOBS_SUBMITTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("transcriptor_jobs_submitted_total", "Total jobs submitted").unwrap()
});

/// Jobs finished total by outcome.
pub static JOBS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("transcriptor_jobs_finished_total", "Total jobs finished"),
        &["outcome"], // "succeeded", "failed"
    )
    .unwrap()
});

/// Jobs currently executing (holding a concurrency permit).
pub static JOBS_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "transcriptor_jobs_running",
        "Number of jobs currently executing",
    )
    .unwrap()
});

/// Job duration in seconds, measured from start of execution.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("transcriptor_job_duration_seconds", "Duration of job execution")
            .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0]),
        &["outcome"],
    )
    .unwrap()
});

/// Items resolved per job.
pub static ITEMS_PER_JOB: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "transcriptor_items_per_job",
            "Number of playlist members resolved per job",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0]),
        &[],
    )
    .unwrap()
});

// =============================================================================
// Collaborators
// =============================================================================

/// Item fetches by outcome.
pub static ITEMS_FETCHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("transcriptor_items_fetched_total", "Total items fetched"),
        &["outcome"], // "transcript", "unavailable", "error"
    )
    .unwrap()
});

/// Resolver strategy attempts by result.
pub static RESOLVER_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "transcriptor_resolver_attempts_total",
            "Total resolver strategy attempts",
        ),
        &["strategy", "result"], // result: "found", "empty", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(JOBS_SUBMITTED.clone()),
        Box::new(JOBS_FINISHED.clone()),
        Box::new(JOBS_RUNNING.clone()),
        Box::new(JOB_DURATION.clone()),
        Box::new(ITEMS_PER_JOB.clone()),
        Box::new(ITEMS_FETCHED.clone()),
        Box::new(RESOLVER_ATTEMPTS.clone()),
    ]
}
