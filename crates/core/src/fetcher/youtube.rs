//! YouTube caption track fetcher.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::FetcherConfig;

use super::{FetchOutcome, Fetcher};

const WATCH_URL: &str = "https://www.youtube.com/watch";

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Marker preceding the caption track list in the watch page.
const CAPTION_TRACKS_KEY: &str = "\"captionTracks\":";

static PLAYABILITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""playabilityStatus":\{"status":"([A-Z_]+)""#).unwrap());

static TEXT_SEGMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<text[^>]*>(.*?)</text>").unwrap());

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Errors internal to the fetcher; surfaced as `FetchOutcome::Error`.
#[derive(Debug, Error)]
enum TranscriptError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(reqwest::StatusCode),

    #[error("video is not playable ({0})")]
    VideoUnavailable(String),

    #[error("malformed caption data: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    /// "asr" for auto-generated captions.
    #[serde(default)]
    kind: Option<String>,
}

impl CaptionTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

/// Fetches transcripts from the captions embedded in a video's watch page.
pub struct YouTubeTranscriptFetcher {
    client: Client,
    languages: Vec<String>,
}

impl YouTubeTranscriptFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            languages: config.languages.clone(),
        })
    }

    async fn get_text(&self, url: &str) -> Result<String, TranscriptError> {
        let response = self
            .client
            .get(url)
            .header("Accept-Language", "en-US,en;q=0.8")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(TranscriptError::Status(response.status()));
        }
        Ok(response.text().await?)
    }

    /// `Ok(None)` means the video has no transcript.
    async fn fetch_transcript(&self, video_id: &str) -> Result<Option<String>, TranscriptError> {
        let watch_url = format!("{}?v={}", WATCH_URL, urlencoding::encode(video_id));
        let html = self.get_text(&watch_url).await?;

        let tracks = match extract_json_array(&html, CAPTION_TRACKS_KEY) {
            Some(raw) => serde_json::from_str::<Vec<CaptionTrack>>(raw)
                .map_err(|e| TranscriptError::Malformed(e.to_string()))?,
            None => {
                return match playability_status(&html) {
                    Some(status) if status != "OK" => {
                        Err(TranscriptError::VideoUnavailable(status.to_string()))
                    }
                    _ => Ok(None),
                };
            }
        };

        let Some(track) = select_track(&tracks, &self.languages) else {
            return Ok(None);
        };
        debug!(
            video_id,
            language = %track.language_code,
            generated = track.is_generated(),
            "Selected caption track"
        );

        let xml = self.get_text(&track.base_url).await?;
        Ok(Some(parse_timed_text(&xml).join("\n")))
    }
}

#[async_trait]
impl Fetcher for YouTubeTranscriptFetcher {
    fn name(&self) -> &str {
        "youtube"
    }

    async fn fetch(&self, member_id: &str) -> FetchOutcome {
        match self.fetch_transcript(member_id).await {
            Ok(Some(text)) => FetchOutcome::Transcript(text),
            Ok(None) => FetchOutcome::Unavailable,
            Err(e) => FetchOutcome::Error(e.to_string()),
        }
    }
}

/// Locate the JSON array following `key` and return it as a slice,
/// honouring nesting and string literals.
fn extract_json_array<'a>(haystack: &'a str, key: &str) -> Option<&'a str> {
    let start = haystack.find(key)? + key.len();
    let rest = &haystack[start..];
    if !rest.starts_with('[') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in rest.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&rest[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

fn playability_status(html: &str) -> Option<&str> {
    PLAYABILITY_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Pick the best track: manual captions in a preferred language, then
/// generated ones in a preferred language, then whatever comes first.
fn select_track<'a>(tracks: &'a [CaptionTrack], languages: &[String]) -> Option<&'a CaptionTrack> {
    for language in languages {
        let in_language: Vec<&CaptionTrack> = tracks
            .iter()
            .filter(|t| &t.language_code == language)
            .collect();
        let manual = in_language.iter().find(|t| !t.is_generated()).copied();
        if let Some(track) = manual.or_else(|| in_language.first().copied()) {
            return Some(track);
        }
    }
    tracks.first()
}

/// Extract caption lines from YouTube's timed-text XML.
fn parse_timed_text(xml: &str) -> Vec<String> {
    TEXT_SEGMENT_RE
        .captures_iter(xml)
        .filter_map(|caps| caps.get(1))
        .map(|m| {
            // Segment text is entity-encoded twice; inline markup sits in between.
            let once = decode_entities(m.as_str());
            let stripped = TAG_RE.replace_all(&once, "");
            decode_entities(&stripped)
        })
        .collect()
}

fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match tail.find(';').and_then(|end| {
            decode_entity(&tail[1..end]).map(|decoded| (decoded, end))
        }) {
            Some((decoded, end)) => {
                out.push(decoded);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}
