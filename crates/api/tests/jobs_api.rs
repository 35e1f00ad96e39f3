//! Integration tests for the `/api/jobs` resource.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use common::{body_json, get, poll_until, post_empty, post_json, STORY};
use pixarify_core::job::AnimationResult;
use pixarify_core::scene::Scene;
use pixarify_core::types::{new_job_id, JobId};
use pixarify_pipeline::backend::{BackendError, PhaseRequest, StoryRequest};
use pixarify_pipeline::GenerationBackend;
use serde_json::json;

/// Backend that takes far longer per phase than any test waits.
struct StalledBackend;

#[async_trait]
impl GenerationBackend for StalledBackend {
    async fn generate_story(&self, _: &StoryRequest) -> Result<String, BackendError> {
        Ok(STORY.to_string())
    }

    async fn generate_phase_artifact(
        &self,
        _: PhaseRequest<'_>,
    ) -> Result<Option<String>, BackendError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(None)
    }

    async fn assemble_animation(
        &self,
        job_id: JobId,
        _: &[Scene],
        _: &[String],
    ) -> Result<AnimationResult, BackendError> {
        Ok(AnimationResult {
            animation_url: format!("/animation-complete/{job_id}"),
            artifacts: vec![],
        })
    }
}

async fn submit(app: &axum::Router) -> String {
    let response = post_json(app.clone(), "/api/jobs", json!({ "story": STORY })).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    body_json(response).await["data"]["jobId"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn submit_returns_running_snapshot() {
    let (app, _) = common::build_test_app();
    let response = post_json(app, "/api/jobs", json!({ "story": STORY, "settings": {} })).await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let data = &body_json(response).await["data"];
    assert!(data["jobId"].is_string());
    assert_eq!(data["totalPhases"], 6);
    assert!(data["progress"].as_u64().unwrap() <= 100);
}

#[tokio::test]
async fn submitted_job_completes_with_result() {
    let (app, _) = common::build_test_app();
    let id = submit(&app).await;

    let json = poll_until(&app, &format!("/api/jobs/{id}"), |j| {
        j["data"]["state"] == "completed"
    })
    .await;
    let data = &json["data"];
    assert_eq!(data["progress"], 100);
    assert_eq!(data["currentPhase"], 6);
    assert_eq!(
        data["result"]["animationUrl"],
        format!("/animation-complete/{id}")
    );
    assert!(data.get("error").is_none());
}

#[tokio::test]
async fn submit_without_story_is_400() {
    let (app, _) = common::build_test_app();
    let response = post_json(app, "/api/jobs", json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_unknown_job_is_404() {
    let (app, _) = common::build_test_app();
    let response = get(app, &format!("/api/jobs/{}", new_job_id())).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

#[tokio::test]
async fn cancel_running_job_returns_204_and_fails_it() {
    let (app, _) =
        common::build_test_app_with(common::test_config(), Arc::new(StalledBackend));
    let id = submit(&app).await;

    let response = post_empty(app.clone(), &format!("/api/jobs/{id}/cancel")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let data = body_json(get(app, &format!("/api/jobs/{id}")).await).await["data"].clone();
    assert_eq!(data["state"], "failed");
    assert_eq!(data["error"], "cancelled");
}

#[tokio::test]
async fn cancel_finished_job_is_invalid_transition() {
    let (app, _) = common::build_test_app();
    let id = submit(&app).await;
    poll_until(&app, &format!("/api/jobs/{id}"), |j| {
        j["data"]["state"] == "completed"
    })
    .await;

    let response = post_empty(app, &format!("/api/jobs/{id}/cancel")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_TRANSITION");
    assert!(json["details"].as_str().unwrap().contains("completed"));
}

#[tokio::test]
async fn cancel_unknown_job_is_404() {
    let (app, _) = common::build_test_app();
    let response = post_empty(app, &format!("/api/jobs/{}/cancel", new_job_id())).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn concurrent_jobs_do_not_mix() {
    let (app, _) = common::build_test_app();
    let a = post_json(app.clone(), "/api/jobs", json!({ "story": "One fish. Two fish." })).await;
    let b = post_json(
        app.clone(),
        "/api/jobs",
        json!({ "story": "Red car. Blue car. Green car." }),
    )
    .await;
    let a = body_json(a).await["data"]["jobId"].as_str().unwrap().to_string();
    let b = body_json(b).await["data"]["jobId"].as_str().unwrap().to_string();
    assert_ne!(a, b);

    for id in [&a, &b] {
        let json = poll_until(&app, &format!("/api/jobs/{id}"), |j| {
            j["data"]["state"] == "completed"
        })
        .await;
        assert_eq!(json["data"]["jobId"], id.as_str());
        assert_eq!(
            json["data"]["result"]["animationUrl"],
            format!("/animation-complete/{id}")
        );
    }
}
