use axum::routing::post;
use axum::Router;

use crate::handlers::story;
use crate::state::AppState;

/// ```text
/// POST   /generate-story      -> generate_story
/// POST   /refine-story        -> refine_story
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate-story", post(story::generate_story))
        .route("/refine-story", post(story::refine_story))
}
