//! Route definitions for the scene and animation endpoints.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::animation;
use crate::state::AppState;

/// Routes mounted at the `/api` root.
///
/// ```text
/// POST   /generate-scenes      -> generate_scenes
/// POST   /generate-animation   -> generate_animation
/// GET    /animation-progress   -> animation_progress
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate-scenes", post(animation::generate_scenes))
        .route("/generate-animation", post(animation::generate_animation))
        .route("/animation-progress", get(animation::animation_progress))
}
