//! Handlers for story generation and refinement.

use axum::extract::State;
use axum::Json;
use pixarify_core::story::{RefinedStory, StorySettings};
use pixarify_pipeline::backend::{refine_story as refine_with_backend, write_story};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /api/generate-story`.
#[derive(Debug, Deserialize)]
pub struct GenerateStoryRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub settings: StorySettings,
}

#[derive(Debug, Serialize)]
pub struct GenerateStoryResponse {
    pub story: String,
}

/// POST /api/generate-story
///
/// Ask the generation backend for a story about `prompt`. Missing settings
/// fall back to their defaults.
pub async fn generate_story(
    State(state): State<AppState>,
    AppJson(input): AppJson<GenerateStoryRequest>,
) -> AppResult<Json<GenerateStoryResponse>> {
    let story = write_story(
        state.runner.backend().as_ref(),
        &input.prompt,
        input.settings,
    )
    .await?;

    tracing::info!(chars = story.len(), "Story generated");
    Ok(Json(GenerateStoryResponse { story }))
}

/// Request body for `POST /api/refine-story`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefineStoryRequest {
    pub story_content: Option<String>,
    #[serde(default)]
    pub settings: StorySettings,
}

/// POST /api/refine-story
///
/// Restructure a draft story into titled scenes with visual descriptions
/// and narration.
pub async fn refine_story(
    State(state): State<AppState>,
    AppJson(input): AppJson<RefineStoryRequest>,
) -> AppResult<Json<DataResponse<RefinedStory>>> {
    let content = input
        .story_content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("No story content provided".to_string()))?;

    let refined = refine_with_backend(
        state.runner.backend().as_ref(),
        &content,
        input.settings,
    )
    .await?;

    tracing::info!(scenes = refined.scenes.len(), title = %refined.title, "Story refined");
    Ok(Json(DataResponse { data: refined }))
}
