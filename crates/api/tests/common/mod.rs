#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use pixarify_api::config::{JobConfig, ServerConfig};
use pixarify_api::router::build_app_router;
use pixarify_api::state::AppState;
use pixarify_pipeline::{GenerationBackend, SimulatedBackend};

pub const STORY: &str = "A cat sat. A dog ran. A bird flew. A fish swam.";

/// Build a test `ServerConfig` with safe defaults and near-instant phases.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jobs: JobConfig {
            phase_delay_ms: 5,
            phase_timeout_secs: 5,
            retention_secs: 3600,
            retention_sweep_secs: 60,
            animation_url_base: "/animation-complete".to_string(),
        },
    }
}

/// State plus router wired the way `main.rs` wires them.
pub fn build_test_app() -> (Router, AppState) {
    build_test_app_with(test_config(), Arc::new(SimulatedBackend::default()))
}

pub fn build_test_app_with(
    config: ServerConfig,
    backend: Arc<dyn GenerationBackend>,
) -> (Router, AppState) {
    let state = AppState::new(config.clone(), backend);
    let app = build_app_router(state.clone(), &config);
    (app, state)
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST a raw body labelled as JSON, for malformed payloads.
pub async fn post_raw_json(app: Router, uri: &str, body: &'static str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Poll `uri` until `done` accepts the JSON body.
pub async fn poll_until(
    app: &Router,
    uri: &str,
    done: impl Fn(&serde_json::Value) -> bool,
) -> serde_json::Value {
    for _ in 0..500 {
        let json = body_json(get(app.clone(), uri).await).await;
        if done(&json) {
            return json;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition on {uri} not met in time");
}
