//! Handlers for the `/jobs` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use pixarify_core::types::JobId;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /api/jobs`.
#[derive(Debug, Deserialize)]
pub struct SubmitJob {
    pub story: Option<String>,
    #[serde(default)]
    pub settings: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

/// POST /api/jobs
///
/// Split the story, create a job and start it. Returns 202 with the
/// job's first snapshot.
pub async fn submit_job(
    State(state): State<AppState>,
    AppJson(input): AppJson<SubmitJob>,
) -> AppResult<impl IntoResponse> {
    let story = input
        .story
        .ok_or_else(|| AppError::BadRequest("Story text is required".into()))?;

    let job = state.runner.submit_and_start(&story, input.settings).await?;
    let snapshot = state.reporter.query(job.id).await?;

    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: snapshot })))
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

/// GET /api/jobs/{id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> AppResult<impl IntoResponse> {
    let snapshot = state.reporter.query(job_id).await?;
    Ok(Json(DataResponse { data: snapshot }))
}

// ---------------------------------------------------------------------------
// Cancel
// ---------------------------------------------------------------------------

/// POST /api/jobs/{id}/cancel
///
/// Cancel a pending or running job. Returns 204 on success; a job that
/// already finished is rejected as an invalid transition.
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> AppResult<StatusCode> {
    state.runner.cancel(job_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
