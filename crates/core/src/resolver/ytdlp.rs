//! yt-dlp backed resolution strategy.

use async_trait::async_trait;
use serde::Deserialize;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use crate::config::ResolverConfig;

use super::{ResolveError, Resolver};

/// Maximum number of stderr characters carried into an error message.
const STDERR_EXCERPT_LEN: usize = 300;

/// Lists playlist members with `yt-dlp --flat-playlist`.
///
/// Nothing is downloaded; yt-dlp only enumerates the entries.
pub struct YtDlpResolver {
    config: ResolverConfig,
}

/// The subset of yt-dlp's JSON dump this strategy reads.
#[derive(Debug, Deserialize)]
struct FlatInfo {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "_type")]
    kind: Option<String>,
    #[serde(default)]
    entries: Option<Vec<Option<FlatEntry>>>,
}

#[derive(Debug, Deserialize)]
struct FlatEntry {
    #[serde(default)]
    id: Option<String>,
}

impl YtDlpResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// Extract member IDs from `yt-dlp --dump-single-json` output.
    ///
    /// Entries without an ID (private or deleted videos) are skipped. A URL
    /// pointing at a single video yields that video's ID.
    fn parse_output(stdout: &[u8]) -> Result<Vec<String>, ResolveError> {
        let info: FlatInfo =
            serde_json::from_slice(stdout).map_err(|e| ResolveError::Parse(e.to_string()))?;

        match info.entries {
            Some(entries) => Ok(entries
                .into_iter()
                .flatten()
                .filter_map(|entry| entry.id)
                .collect()),
            None if info.kind.as_deref().unwrap_or("video") == "video" => {
                Ok(info.id.into_iter().collect())
            }
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl Resolver for YtDlpResolver {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn resolve(&self, source_url: &str) -> Result<Vec<String>, ResolveError> {
        debug!(source_url, binary = %self.config.ytdlp_path, "Resolving playlist with yt-dlp");

        let child = Command::new(&self.config.ytdlp_path)
            .args([
                "--flat-playlist",
                "--dump-single-json",
                "--no-warnings",
                "--quiet",
            ])
            .arg(source_url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = timeout(Duration::from_secs(self.config.timeout_secs), child)
            .await
            .map_err(|_| ResolveError::Timeout {
                secs: self.config.timeout_secs,
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ResolveError::CommandFailed(format!(
                "{}: {}",
                output.status,
                stderr.trim().chars().take(STDERR_EXCERPT_LEN).collect::<String>()
            )));
        }

        Self::parse_output(&output.stdout)
    }
}
