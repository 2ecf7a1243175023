//! Common test utilities for API testing with mocks.
//!
//! Creates an in-process router backed by a real job registry whose
//! resolver and fetcher are mocks, so jobs run end to end without yt-dlp or
//! network access.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use transcriptor_core::{
    config::{Config, JobsConfig, StorageConfig},
    testing::{MockFetcher, MockResolver},
    JobRegistry,
};

/// Re-export fixtures for test convenience
pub use transcriptor_core::testing::fixtures;

/// Test fixture for API testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_submission() {
///     let fixture = TestFixture::with_members(&["a", "b"]);
///
///     let response = fixture.post("/api/v1/transcripts", json!({
///         "playlist_url": "https://www.youtube.com/playlist?list=PL1"
///     })).await;
///
///     assert_eq!(response.status, 202);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock resolver - configure playlist members
    pub resolver: Arc<MockResolver>,
    /// Mock fetcher - configure per-item outcomes
    pub fetcher: Arc<MockFetcher>,
    /// Temporary directory holding archives
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Parsed JSON body, `Null` when empty or not JSON
    pub body: Value,
    /// Raw body bytes
    pub bytes: Vec<u8>,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

impl TestFixture {
    /// Create a fixture whose resolver returns no members.
    pub fn new() -> Self {
        Self::with_members(&[])
    }

    /// Create a fixture whose resolver returns `members`.
    pub fn with_members(members: &[&str]) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let resolver = Arc::new(MockResolver::with_members(members.iter().copied()));
        let fetcher = Arc::new(MockFetcher::new());

        let config = Config {
            storage: StorageConfig {
                archive_dir: temp_dir.path().join("archives"),
            },
            jobs: JobsConfig { max_concurrent: 2 },
            ..Default::default()
        };

        let registry = Arc::new(
            JobRegistry::new(
                Arc::clone(&resolver) as Arc<dyn transcriptor_core::Resolver>,
                Arc::clone(&fetcher) as Arc<dyn transcriptor_core::Fetcher>,
                config.storage.archive_dir.clone(),
            )
            .with_max_concurrent(config.jobs.max_concurrent),
        );

        let state = Arc::new(transcriptor_server::state::AppState::new(config, registry));
        let router = transcriptor_server::api::create_router(state);

        Self {
            router,
            resolver,
            fetcher,
            temp_dir,
        }
    }

    /// Submit a job and return its ID.
    pub async fn submit(&self, playlist_url: &str) -> String {
        let response = self
            .post(
                "/api/v1/transcripts",
                serde_json::json!({ "playlist_url": playlist_url }),
            )
            .await;
        assert_eq!(response.status, StatusCode::ACCEPTED, "{:?}", response.body);
        response.body["job_id"]
            .as_str()
            .expect("job_id should be a string")
            .to_string()
    }

    /// Read the full event stream of a job (ends at the terminal event).
    pub async fn events(&self, job_id: &str) -> TestResponse {
        tokio::time::timeout(
            Duration::from_secs(5),
            self.get(&format!("/api/v1/transcripts/{job_id}/events")),
        )
        .await
        .expect("Event stream did not end in time")
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        let body: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
            bytes,
        }
    }
}

/// One parsed Server-Sent Event.
#[derive(Debug, Clone, PartialEq)]
pub struct SseMessage {
    pub event: String,
    pub data: Value,
}

/// Parse a complete `text/event-stream` body, skipping keep-alive comments.
pub fn parse_sse(text: &str) -> Vec<SseMessage> {
    text.split("\n\n")
        .filter_map(|block| {
            let mut event = None;
            let mut data = None;
            for line in block.lines() {
                if let Some(value) = line.strip_prefix("event:") {
                    event = Some(value.trim().to_string());
                } else if let Some(value) = line.strip_prefix("data:") {
                    data = serde_json::from_str(value.trim()).ok();
                }
            }
            Some(SseMessage {
                event: event?,
                data: data?,
            })
        })
        .collect()
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}
