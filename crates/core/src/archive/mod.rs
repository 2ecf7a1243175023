//! ZIP archive assembly.
//!
//! [`ArchiveBuilder`] writes one text entry per member straight to disk as
//! results arrive, so a job never holds the whole batch in memory.
//! [`ArchiveWriter`] drives the same builder from async code, running every
//! file operation on the blocking thread pool.

mod builder;
mod error;
mod writer;

pub use builder::{entry_name, ArchiveBuilder, ArchiveSummary, ARCHIVE_CONTENT_TYPE};
pub use error::ArchiveError;
pub use writer::ArchiveWriter;
