//! Transcript job API handlers.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{
        sse::{Event as SseEvent, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, error};
use transcriptor_core::{JobError, JobId, JobSnapshot, JobState, ProgressEvent};

use crate::metrics::{ARCHIVE_DOWNLOADS_TOTAL, EVENT_STREAMS_ACTIVE, EVENT_STREAMS_TOTAL};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for submitting a job
#[derive(Debug, Deserialize)]
pub struct SubmitJobBody {
    /// Playlist (or single video) URL to archive
    #[serde(default)]
    pub playlist_url: Option<String>,
}

/// Response for an accepted submission
#[derive(Debug, Serialize)]
pub struct SubmitJobResponse {
    pub job_id: JobId,
    pub status: &'static str,
}

/// Response for listing jobs
#[derive(Debug, Serialize)]
pub struct ListJobsResponse {
    pub jobs: Vec<JobSnapshot>,
    pub total: usize,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct JobErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<JobState>,
}

/// `JobError` carried to the HTTP boundary.
pub struct ApiError(JobError);

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, state) = match &self.0 {
            JobError::InvalidSource(_) => (StatusCode::BAD_REQUEST, None),
            JobError::NotFound(_) => (StatusCode::NOT_FOUND, None),
            JobError::NotReady { state, .. } | JobError::Active { state, .. } => {
                (StatusCode::CONFLICT, Some(*state))
            }
            other => {
                error!(error = %other, "Job request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
        };

        let body = JobErrorResponse {
            error: self.0.to_string(),
            state,
        };
        (status, Json(body)).into_response()
    }
}

/// Parse a path segment as a job ID; malformed IDs are simply unknown.
fn parse_job_id(raw: &str) -> Result<JobId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError(JobError::NotFound(raw.to_string())))
}

// ============================================================================
// Handlers
// ============================================================================

/// Submit a new job
pub async fn submit_job(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SubmitJobBody>,
) -> Result<(StatusCode, Json<SubmitJobResponse>), ApiError> {
    let url = body.playlist_url.unwrap_or_default();
    let job_id = state.registry().submit(&url).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitJobResponse {
            job_id,
            status: "accepted",
        }),
    ))
}

/// List all jobs, oldest first
pub async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<ListJobsResponse> {
    let jobs = state.registry().list().await;
    Json(ListJobsResponse {
        total: jobs.len(),
        jobs,
    })
}

/// Get a job by ID
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobSnapshot>, ApiError> {
    let job_id = parse_job_id(&id)?;
    Ok(Json(state.registry().get(job_id).await?))
}

/// Remove a finished job and its archive
pub async fn delete_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let job_id = parse_job_id(&id)?;
    state.registry().remove(job_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Stream a job's progress as Server-Sent Events.
///
/// Replays every event recorded so far, then follows live events until the
/// terminal one.
pub async fn job_events(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    let job_id = parse_job_id(&id)?;
    let events = state.registry().subscribe(job_id).await?;

    debug!(%job_id, "Event stream opened");
    let guard = StreamGuard::open();
    let stream = events.into_stream().map(move |event| {
        let _guard = &guard;
        Ok(to_sse_event(&event))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Download the archive of a succeeded job
pub async fn download_archive(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let job_id = parse_job_id(&id)?;
    let artifact = state.registry().retrieve(job_id).await?;
    ARCHIVE_DOWNLOADS_TOTAL.inc();

    let disposition = format!("attachment; filename=\"{}\"", artifact.file_name);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, artifact.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
        .into_response())
}

fn to_sse_event(event: &ProgressEvent) -> SseEvent {
    match serde_json::to_string(event) {
        Ok(data) => SseEvent::default().event(event.kind.as_str()).data(data),
        Err(e) => SseEvent::default()
            .event("error")
            .data(format!(r#"{{"error":"{e}"}}"#)),
    }
}

/// Keeps the open-stream gauge accurate however the stream ends.
struct StreamGuard;

impl StreamGuard {
    fn open() -> Self {
        EVENT_STREAMS_TOTAL.inc();
        EVENT_STREAMS_ACTIVE.inc();
        Self
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        EVENT_STREAMS_ACTIVE.dec();
    }
}
