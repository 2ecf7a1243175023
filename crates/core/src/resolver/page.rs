//! Playlist page scraping strategy.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::config::ResolverConfig;

use super::{ResolveError, Resolver};

/// Browser-like user agent; the plain reqwest agent gets a consent page.
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

static PLAYLIST_VIDEO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""playlistVideoRenderer":\{"videoId":"([A-Za-z0-9_-]{11})""#).unwrap()
});

/// Resolves a playlist by reading video IDs embedded in the playlist page.
///
/// Only the first page of a playlist is visible this way (about 100 entries).
pub struct PlaylistPageResolver {
    client: Client,
}

impl PlaylistPageResolver {
    pub fn new(config: &ResolverConfig) -> Result<Self, ResolveError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.page_timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ResolveError::Http(e.to_string()))?;
        Ok(Self { client })
    }

    /// Extract playlist member IDs from page HTML, in page order.
    fn extract_ids(html: &str) -> Vec<String> {
        PLAYLIST_VIDEO_RE
            .captures_iter(html)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

#[async_trait]
impl Resolver for PlaylistPageResolver {
    fn name(&self) -> &str {
        "playlist-page"
    }

    async fn resolve(&self, source_url: &str) -> Result<Vec<String>, ResolveError> {
        debug!(source_url, "Resolving playlist from page");

        let response = self
            .client
            .get(source_url)
            .header("Accept-Language", "en-US,en;q=0.8")
            .send()
            .await
            .map_err(|e| ResolveError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ResolveError::Http(format!("HTTP {}", response.status())));
        }

        let html = response
            .text()
            .await
            .map_err(|e| ResolveError::Http(e.to_string()))?;

        Ok(Self::extract_ids(&html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_ids_in_page_order() {
        let html = r#"
            var ytInitialData = {"contents":[
              {"playlistVideoRenderer":{"videoId":"dQw4w9WgXcQ","thumbnail":{}}},
              {"playlistVideoRenderer":{"videoId":"9bZkp7q19f0","thumbnail":{}}},
              {"compactVideoRenderer":{"videoId":"kJQP7kiw5Fk"}}
            ]};
        "#;
        let ids = PlaylistPageResolver::extract_ids(html);
        assert_eq!(ids, vec!["dQw4w9WgXcQ", "9bZkp7q19f0"]);
    }

    #[test]
    fn test_extract_ids_none_found() {
        assert!(PlaylistPageResolver::extract_ids("<html></html>").is_empty());
    }

    #[test]
    fn test_new_with_default_config() {
        assert!(PlaylistPageResolver::new(&ResolverConfig::default()).is_ok());
    }
}
