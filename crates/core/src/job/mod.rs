//! Asynchronous job orchestration.
//!
//! A job takes one source URL through resolve -> fetch-per-member ->
//! archive, off the caller's request path:
//!
//! - [`JobRegistry`] owns all jobs and spawns their execution
//! - each [`Job`] carries a state machine and an [`EventLog`]
//! - readers attach through [`EventStream`] at any time and replay the
//!   full progress history before receiving live events
//!
//! # Example
//!
//! ```ignore
//! use transcriptor_core::job::JobRegistry;
//!
//! let registry = JobRegistry::new(resolver, fetcher, "/var/lib/transcriptor");
//! let job_id = registry.submit("https://www.youtube.com/playlist?list=PL123").await?;
//!
//! let mut events = registry.subscribe(job_id).await?;
//! while let Some(event) = events.next_event().await {
//!     println!("{}% {}", event.percent, event.message);
//! }
//!
//! let archive = registry.retrieve(job_id).await?;
//! std::fs::write(&archive.file_name, &archive.bytes)?;
//! ```

mod error;
mod events;
mod registry;
mod runner;
mod state;
mod types;

pub use error::JobError;
pub use events::{EventLog, EventLogError, EventStream};
pub use registry::{ArchiveArtifact, JobRegistry};
pub use runner::{item_percent, job_dir, ARCHIVE_FILE_NAME};
pub use state::Job;
pub use types::{EventKind, JobId, JobSnapshot, JobState, ProgressEvent};
