//! Trait definitions for the fetcher module.

use async_trait::async_trait;
use serde::Serialize;

/// Archive text recorded for members without a transcript.
pub const UNAVAILABLE_SENTINEL: &str = "[No transcript available]";

/// Prefix of the archive text recorded for failed fetches.
pub const ERROR_PREFIX: &str = "Error fetching transcript: ";

/// Result of fetching one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FetchOutcome {
    /// The transcript text. May legitimately be empty.
    Transcript(String),
    /// The member has no transcript (captions disabled or absent).
    Unavailable,
    /// Fetching failed; carries a human-readable cause.
    Error(String),
}

impl FetchOutcome {
    /// Text written to the archive entry for this outcome.
    pub fn render(&self) -> String {
        match self {
            Self::Transcript(text) => text.clone(),
            Self::Unavailable => UNAVAILABLE_SENTINEL.to_string(),
            Self::Error(detail) => format!("{ERROR_PREFIX}{detail}"),
        }
    }

    /// Short label used for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Transcript(_) => "transcript",
            Self::Unavailable => "unavailable",
            Self::Error(_) => "error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Retrieves the textual payload for one collection member.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Returns the name of this fetcher implementation.
    fn name(&self) -> &str;

    /// Fetch the payload for `member_id`.
    async fn fetch(&self, member_id: &str) -> FetchOutcome;
}
