pub mod animation;
pub mod health;
pub mod jobs;
pub mod story;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /generate-story                 write a story (POST)
/// /refine-story                   restructure a draft into scenes (POST)
/// /generate-scenes                split a story into scenes (POST)
/// /generate-animation             start an animation job (POST)
/// /animation-progress             latest job's progress (GET)
///
/// /jobs                           submit and start (POST)
/// /jobs/{id}                      progress snapshot (GET)
/// /jobs/{id}/cancel               cancel (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(story::router())
        .merge(animation::router())
        .nest("/jobs", jobs::router())
}
