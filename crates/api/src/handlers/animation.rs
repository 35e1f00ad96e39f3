//! Handlers for the scene and animation endpoints polled by the web client.
//!
//! These keep the flat response bodies the client already understands.
//! `animation-progress` reports the most recently submitted job; per-job
//! queries live under `/api/jobs`.

use axum::extract::State;
use axum::Json;
use pixarify_core::scene::{split_scenes, Scene};
use pixarify_core::types::JobId;
use pixarify_pipeline::backend::animation_url;
use pixarify_pipeline::LegacyProgress;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Scenes
// ---------------------------------------------------------------------------

/// Request body for `POST /api/generate-scenes`.
#[derive(Debug, Deserialize)]
pub struct GenerateScenesRequest {
    pub story: Option<String>,
    /// Accepted for client compatibility; splitting ignores it.
    #[serde(default)]
    pub settings: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct GenerateScenesResponse {
    pub scenes: Vec<Scene>,
}

/// POST /api/generate-scenes
///
/// Split a story into scenes. Returns 400 when the story is missing or has
/// no sentences.
pub async fn generate_scenes(
    AppJson(input): AppJson<GenerateScenesRequest>,
) -> AppResult<Json<GenerateScenesResponse>> {
    let story = input
        .story
        .ok_or_else(|| AppError::BadRequest("Story text is required".into()))?;

    let scenes = split_scenes(&story)?;
    tracing::debug!(scenes = scenes.len(), "Story split into scenes");

    Ok(Json(GenerateScenesResponse { scenes }))
}

// ---------------------------------------------------------------------------
// Animation
// ---------------------------------------------------------------------------

/// Request body for `POST /api/generate-animation`.
#[derive(Debug, Deserialize)]
pub struct GenerateAnimationRequest {
    pub scenes: Option<Vec<Scene>>,
    #[serde(default)]
    pub settings: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAnimationResponse {
    pub message: &'static str,
    pub animation_url: String,
    pub job_id: JobId,
}

/// POST /api/generate-animation
///
/// Create and start an animation job for the given scenes. Returns as soon
/// as the job is running; progress is polled separately.
pub async fn generate_animation(
    State(state): State<AppState>,
    AppJson(input): AppJson<GenerateAnimationRequest>,
) -> AppResult<Json<GenerateAnimationResponse>> {
    let scenes = input
        .scenes
        .filter(|scenes| !scenes.is_empty())
        .ok_or_else(|| AppError::BadRequest("Valid scenes array is required".into()))?;

    let job = state.runner.submit_scenes(scenes, input.settings).await?;
    let job = state.runner.start(job.id).await?;

    Ok(Json(GenerateAnimationResponse {
        message: "Animation generation started",
        animation_url: animation_url(&state.config.jobs.animation_url_base, job.id),
        job_id: job.id,
    }))
}

/// GET /api/animation-progress
///
/// Progress of the most recently submitted job, or the initial record when
/// nothing has been submitted yet.
pub async fn animation_progress(State(state): State<AppState>) -> Json<LegacyProgress> {
    Json(state.reporter.latest_legacy().await)
}
