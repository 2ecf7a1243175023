//! Trait definitions for the resolver module.

use async_trait::async_trait;
use thiserror::Error;

/// Errors a single resolution strategy can report.
///
/// These never reach API callers: the job treats any failure as "no members".
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The external command exited unsuccessfully.
    #[error("Command failed: {0}")]
    CommandFailed(String),

    /// The strategy did not finish in time.
    #[error("Resolution timed out after {secs}s")]
    Timeout { secs: u64 },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The response could not be interpreted.
    #[error("Failed to parse playlist: {0}")]
    Parse(String),

    /// I/O error (e.g. the binary could not be spawned).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A strategy that expands a collection URL into member IDs.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Returns the name of this strategy (used in logs and metrics).
    fn name(&self) -> &str;

    /// Resolve `source_url` into member IDs, in collection order.
    ///
    /// An empty list is a valid result and means the strategy found nothing.
    async fn resolve(&self, source_url: &str) -> Result<Vec<String>, ResolveError>;
}
