//! Error types for the archive module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Failed to create the archive's directory.
    #[error("Failed to create archive directory: {}", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An entry with the same name was already written.
    #[error("Duplicate archive entry: {name}")]
    DuplicateEntry { name: String },

    /// ZIP encoding failed.
    #[error("Archive write failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The blocking task running an archive operation panicked or was cancelled.
    #[error("Archive task failed: {0}")]
    TaskFailed(String),

    /// A previous operation lost the underlying writer.
    #[error("Archive writer is no longer available")]
    Closed,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
