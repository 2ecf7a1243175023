//! HTTP contract tests for the transcript job API.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{fixtures, parse_sse, TestFixture};
use transcriptor_core::FetchOutcome;

const PLAYLIST: &str = "https://www.youtube.com/playlist?list=PLtest";

// =============================================================================
// Health / config / metrics
// =============================================================================

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/health").await;

    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "status", json!("ok"));
}

#[tokio::test]
async fn test_config_reports_effective_values() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/config").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["jobs"]["max_concurrent"], 2);
    assert_eq!(response.body["server"]["port"], 5000);
    assert_eq!(response.body["fetcher"]["languages"], json!(["en"]));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::with_members(&["a"]);
    let job_id = fixture.submit(PLAYLIST).await;
    fixture.events(&job_id).await;

    let response = fixture.get("/metrics").await;
    assert_status!(response, StatusCode::OK);
    let text = response.text();
    assert!(text.contains("transcriptor_jobs_submitted_total"));
    assert!(text.contains("transcriptor_jobs_by_state"));
}

// =============================================================================
// Submission
// =============================================================================

#[tokio::test]
async fn test_submit_returns_accepted() {
    let fixture = TestFixture::with_members(&["a"]);
    let response = fixture
        .post("/api/v1/transcripts", json!({ "playlist_url": PLAYLIST }))
        .await;

    assert_status!(response, StatusCode::ACCEPTED);
    assert_json_path!(response.body, "status", json!("accepted"));
    assert!(response.body["job_id"].is_string());
}

#[tokio::test]
async fn test_submit_without_url_is_rejected() {
    let fixture = TestFixture::new();

    for body in [json!({}), json!({ "playlist_url": "" }), json!({ "playlist_url": "  " })] {
        let response = fixture.post("/api/v1/transcripts", body).await;
        assert_status!(response, StatusCode::BAD_REQUEST);
        assert_json_path!(response.body, "error", json!("Missing playlist_url"));
    }

    let list = fixture.get("/api/v1/transcripts").await;
    assert_eq!(list.body["total"], 0);
}

#[tokio::test]
async fn test_submit_invalid_url_is_rejected() {
    let fixture = TestFixture::new();
    let response = fixture
        .post("/api/v1/transcripts", json!({ "playlist_url": "not a url" }))
        .await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid playlist_url"));
}

#[tokio::test]
async fn test_submit_malformed_json_is_client_error() {
    let fixture = TestFixture::new();
    let response = fixture
        .post_raw("/api/v1/transcripts", "{ playlist_url: ")
        .await;

    assert!(response.status.is_client_error());
}

// =============================================================================
// Lookup
// =============================================================================

#[tokio::test]
async fn test_get_and_list_jobs() {
    let fixture = TestFixture::with_members(&["a", "b"]);
    let job_id = fixture.submit(PLAYLIST).await;
    fixture.events(&job_id).await;

    let response = fixture.get(&format!("/api/v1/transcripts/{job_id}")).await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "id", json!(job_id));
    assert_json_path!(response.body, "state", json!("succeeded"));
    assert_json_path!(response.body, "source_url", json!(PLAYLIST));
    assert_json_path!(response.body, "item_count", json!(2));
    assert_json_path!(response.body, "archive_ready", json!(true));
    assert_eq!(response.body["progress"]["percent"], 100);

    let list = fixture.get("/api/v1/transcripts").await;
    assert_status!(list, StatusCode::OK);
    assert_eq!(list.body["total"], 1);
    assert_eq!(list.body["jobs"][0]["id"], json!(job_id));
}

#[tokio::test]
async fn test_unknown_and_malformed_ids_are_not_found() {
    let fixture = TestFixture::new();
    let unknown = transcriptor_core::JobId::new().to_string();

    for id in [unknown.as_str(), "not-a-job-id"] {
        for suffix in ["", "/events", "/archive"] {
            let response = fixture
                .get(&format!("/api/v1/transcripts/{id}{suffix}"))
                .await;
            assert_status!(response, StatusCode::NOT_FOUND);
        }
        let response = fixture.delete(&format!("/api/v1/transcripts/{id}")).await;
        assert_status!(response, StatusCode::NOT_FOUND);
    }
}

// =============================================================================
// Event stream
// =============================================================================

#[tokio::test]
async fn test_event_stream_replays_and_terminates() {
    let fixture = TestFixture::with_members(&["a", "b", "c"]);
    let job_id = fixture.submit(PLAYLIST).await;

    let response = fixture.events(&job_id).await;
    assert_status!(response, StatusCode::OK);
    assert!(response
        .header("content-type")
        .unwrap()
        .starts_with("text/event-stream"));

    let events = parse_sse(&response.text());
    let names: Vec<&str> = events.iter().map(|e| e.event.as_str()).collect();
    assert_eq!(
        names,
        vec!["progress", "progress", "progress", "progress", "progress", "complete"]
    );

    let percents: Vec<u64> = events
        .iter()
        .map(|e| e.data["percent"].as_u64().unwrap())
        .collect();
    assert_eq!(percents, vec![0, 5, 35, 65, 95, 100]);
    assert_eq!(events[1].data["message"], "Found 3 items");
    assert_eq!(events[5].data["message"], "Complete");

    // A second subscriber after completion sees the same history.
    let replay = parse_sse(&fixture.events(&job_id).await.text());
    assert_eq!(replay, events);
}

#[tokio::test]
async fn test_event_stream_for_empty_playlist() {
    let fixture = TestFixture::new();
    let job_id = fixture.submit(PLAYLIST).await;

    let events = parse_sse(&fixture.events(&job_id).await.text());
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].data["message"], "Job started");
    assert_eq!(events[1].event, "complete");
    assert_eq!(events[1].data["message"], "No items found");
}

// =============================================================================
// Archive
// =============================================================================

#[tokio::test]
async fn test_archive_download() {
    let fixture = TestFixture::with_members(&["one", "two", "three"]);
    fixture.fetcher.fail_on("two", "HTTP 429").await;
    fixture
        .fetcher
        .set_outcome("three", FetchOutcome::Unavailable)
        .await;
    let job_id = fixture.submit(PLAYLIST).await;
    fixture.events(&job_id).await;

    let path = format!("/api/v1/transcripts/{job_id}/archive");
    let response = fixture.get(&path).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.header("content-type"), Some("application/zip"));
    assert_eq!(
        response.header("content-disposition"),
        Some(format!("attachment; filename=\"transcripts-{job_id}.zip\"").as_str())
    );

    let entries = fixtures::read_archive(&response.bytes);
    assert_eq!(
        entries,
        vec![
            ("one.txt".to_string(), "transcript for one".to_string()),
            (
                "two.txt".to_string(),
                "Error fetching transcript: HTTP 429".to_string()
            ),
            (
                "three.txt".to_string(),
                "[No transcript available]".to_string()
            ),
        ]
    );

    let again = fixture.get(&path).await;
    assert_eq!(again.bytes, response.bytes);
}

#[tokio::test]
async fn test_archive_before_completion_conflicts() {
    let fixture = TestFixture::with_members(&["a"]);
    fixture.fetcher.close_gate();
    let job_id = fixture.submit(PLAYLIST).await;

    let response = fixture
        .get(&format!("/api/v1/transcripts/{job_id}/archive"))
        .await;
    assert_status!(response, StatusCode::CONFLICT);
    assert!(matches!(
        response.body["state"].as_str(),
        Some("pending") | Some("running")
    ));

    fixture.fetcher.open_gate();
    fixture.events(&job_id).await;
    let response = fixture
        .get(&format!("/api/v1/transcripts/{job_id}/archive"))
        .await;
    assert_status!(response, StatusCode::OK);
}

// =============================================================================
// Deletion
// =============================================================================

#[tokio::test]
async fn test_delete_active_job_conflicts() {
    let fixture = TestFixture::with_members(&["a"]);
    fixture.fetcher.close_gate();
    let job_id = fixture.submit(PLAYLIST).await;

    let response = fixture.delete(&format!("/api/v1/transcripts/{job_id}")).await;
    assert_status!(response, StatusCode::CONFLICT);

    fixture.fetcher.open_gate();
    fixture.events(&job_id).await;
}

#[tokio::test]
async fn test_delete_finished_job() {
    let fixture = TestFixture::with_members(&["a"]);
    let job_id = fixture.submit(PLAYLIST).await;
    fixture.events(&job_id).await;

    let response = fixture.delete(&format!("/api/v1/transcripts/{job_id}")).await;
    assert_status!(response, StatusCode::NO_CONTENT);

    let response = fixture.get(&format!("/api/v1/transcripts/{job_id}")).await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_resolver_is_called_with_submitted_url() {
    let fixture = TestFixture::with_members(&["a"]);
    let job_id = fixture.submit(&fixtures::playlist_url("PLrecorded")).await;
    fixture.events(&job_id).await;

    assert_eq!(
        fixture.resolver.recorded_urls().await,
        vec![fixtures::playlist_url("PLrecorded")]
    );
}
