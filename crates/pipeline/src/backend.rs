//! Generation backend capability.
//!
//! [`GenerationBackend`] is the seam to whatever actually writes stories
//! and renders animation artifacts. The pipeline only ever talks to it
//! through `Arc<dyn GenerationBackend>`. [`SimulatedBackend`] is the
//! deterministic stand-in used by the server until a real provider is
//! plugged in, and by tests.

use std::time::Duration;

use async_trait::async_trait;
use pixarify_core::error::CoreError;
use pixarify_core::job::AnimationResult;
use pixarify_core::phase::Phase;
use pixarify_core::scene::{split_scenes, Scene};
use pixarify_core::story::{
    build_refine_prompt, build_story_prompt, parse_refined_story, validate_prompt, RefinedStory,
    StorySettings,
};
use pixarify_core::types::JobId;

/// Default base for animation URLs handed back to clients.
pub const DEFAULT_ANIMATION_URL_BASE: &str = "/animation-complete";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure reported by (or while waiting on) a generation backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("generation request failed: {0}")]
    Request(String),

    #[error("generation backend returned an invalid response: {0}")]
    InvalidResponse(String),

    #[error("generation timed out after {0:?}")]
    Timeout(Duration),
}

impl From<BackendError> for CoreError {
    fn from(err: BackendError) -> Self {
        CoreError::Backend(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Story generation request: the client's subject (or, for refinement,
/// the draft story) plus the full instruction text built from it.
#[derive(Debug, Clone)]
pub struct StoryRequest {
    pub prompt: String,
    pub instructions: String,
    pub settings: StorySettings,
}

/// Work item for one phase of one job.
#[derive(Debug, Clone, Copy)]
pub struct PhaseRequest<'a> {
    pub job_id: JobId,
    /// 1-based phase index.
    pub index: u32,
    pub phase: &'a Phase,
    pub scenes: &'a [Scene],
    pub settings: &'a serde_json::Value,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Text and image generation capability used by the job runner and the
/// story endpoint. All calls are fallible and may be slow.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Write story text for a prompt.
    async fn generate_story(&self, request: &StoryRequest) -> Result<String, BackendError>;

    /// Rewrite a draft story as screenplay JSON, possibly wrapped in prose
    /// or a fenced block.
    async fn refine_story(&self, _request: &StoryRequest) -> Result<String, BackendError> {
        Err(BackendError::Request(
            "story refinement is not supported by this backend".to_string(),
        ))
    }

    /// Perform the work of one phase, optionally returning an artifact
    /// reference.
    async fn generate_phase_artifact(
        &self,
        request: PhaseRequest<'_>,
    ) -> Result<Option<String>, BackendError>;

    /// Combine the per-phase artifacts into the finished animation.
    async fn assemble_animation(
        &self,
        job_id: JobId,
        scenes: &[Scene],
        artifacts: &[String],
    ) -> Result<AnimationResult, BackendError>;
}

/// Validate the prompt and settings, build the instructions, and ask the
/// backend for a story. Blank output counts as a backend failure.
pub async fn write_story(
    backend: &dyn GenerationBackend,
    prompt: &str,
    settings: StorySettings,
) -> Result<String, CoreError> {
    let prompt = validate_prompt(prompt)?;
    settings.check()?;

    let request = StoryRequest {
        prompt: prompt.to_string(),
        instructions: build_story_prompt(prompt, &settings),
        settings,
    };
    let story = backend.generate_story(&request).await?;

    if story.trim().is_empty() {
        return Err(BackendError::InvalidResponse("story text is empty".to_string()).into());
    }
    Ok(story)
}

/// Ask the backend to restructure `content` into a [`RefinedStory`].
///
/// Output that holds no parseable story is [`CoreError::MalformedStory`].
pub async fn refine_story(
    backend: &dyn GenerationBackend,
    content: &str,
    settings: StorySettings,
) -> Result<RefinedStory, CoreError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(CoreError::InvalidInput(
            "No story content provided".to_string(),
        ));
    }
    settings.check()?;

    let request = StoryRequest {
        prompt: content.to_string(),
        instructions: build_refine_prompt(content, &settings),
        settings,
    };
    let raw = backend.refine_story(&request).await?;
    parse_refined_story(&raw)
}

/// URL at which the finished animation for `job_id` is served.
pub fn animation_url(base: &str, job_id: JobId) -> String {
    format!("{}/{job_id}", base.trim_end_matches('/'))
}

// ---------------------------------------------------------------------------
// Simulated backend
// ---------------------------------------------------------------------------

/// Deterministic placeholder backend. Produces a template story and one
/// artifact reference per phase without doing any real work.
#[derive(Debug, Clone)]
pub struct SimulatedBackend {
    animation_url_base: String,
}

impl SimulatedBackend {
    pub fn new(animation_url_base: impl Into<String>) -> Self {
        Self {
            animation_url_base: animation_url_base.into(),
        }
    }
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::new(DEFAULT_ANIMATION_URL_BASE)
    }
}

#[async_trait]
impl GenerationBackend for SimulatedBackend {
    async fn generate_story(&self, request: &StoryRequest) -> Result<String, BackendError> {
        let settings = &request.settings;
        let mut sentences = Vec::new();
        if settings.add_hook {
            sentences.push("What if today changed everything?".to_string());
        }
        sentences.push(format!("Once upon a time, there was {}.", request.prompt));
        sentences.push(format!(
            "Every morning began with a {} little adventure.",
            settings.emotion
        ));
        sentences.push("One day, something unexpected appeared on the path.".to_string());
        sentences.push("With courage and kindness, a plan took shape.".to_string());
        sentences.push("Friends gathered to help, each in their own way.".to_string());
        sentences.push(
            "In the end, everyone learned that trying together makes anything possible."
                .to_string(),
        );
        Ok(sentences.join(" "))
    }

    async fn refine_story(&self, request: &StoryRequest) -> Result<String, BackendError> {
        let settings = &request.settings;
        let texts: Vec<String> = match split_scenes(&request.prompt) {
            Ok(scenes) => scenes.into_iter().map(|s| s.text).collect(),
            Err(_) => vec![request.prompt.clone()],
        };
        let per_scene = (settings.duration / texts.len() as u32).max(1);

        let scenes: Vec<serde_json::Value> = texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                serde_json::json!({
                    "sceneNumber": i + 1,
                    "durationEstimate": per_scene,
                    "visualDescription": format!("A {} illustrated moment: {text}", settings.emotion),
                    "dialogueOrNarration": text,
                })
            })
            .collect();

        let story = serde_json::json!({
            "title": "A Little Adventure",
            "logline": texts.first().cloned().unwrap_or_default(),
            "settings": settings,
            "characters": [
                { "name": "Narrator", "description": format!("A {} storyteller", settings.voice_style) }
            ],
            "scenes": scenes,
        });
        let body = serde_json::to_string_pretty(&story)
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
        Ok(format!("Here is the refined story:\n```json\n{body}\n```"))
    }

    async fn generate_phase_artifact(
        &self,
        request: PhaseRequest<'_>,
    ) -> Result<Option<String>, BackendError> {
        tracing::debug!(
            job_id = %request.job_id,
            phase = request.index,
            phase_name = %request.phase.name,
            scenes = request.scenes.len(),
            "Simulated phase work",
        );
        Ok(Some(format!(
            "simulated://{}/phase-{}",
            request.job_id, request.index
        )))
    }

    async fn assemble_animation(
        &self,
        job_id: JobId,
        _scenes: &[Scene],
        artifacts: &[String],
    ) -> Result<AnimationResult, BackendError> {
        Ok(AnimationResult {
            animation_url: animation_url(&self.animation_url_base, job_id),
            artifacts: artifacts.to_vec(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pixarify_core::scene::split_scenes;
    use pixarify_core::types::new_job_id;

    use super::*;

    struct BlankBackend;

    #[async_trait]
    impl GenerationBackend for BlankBackend {
        async fn generate_story(&self, _: &StoryRequest) -> Result<String, BackendError> {
            Ok("   ".to_string())
        }

        async fn generate_phase_artifact(
            &self,
            _: PhaseRequest<'_>,
        ) -> Result<Option<String>, BackendError> {
            Ok(None)
        }

        async fn assemble_animation(
            &self,
            _: JobId,
            _: &[Scene],
            _: &[String],
        ) -> Result<AnimationResult, BackendError> {
            Err(BackendError::Request("unused".into()))
        }
    }

    #[tokio::test]
    async fn simulated_story_is_splittable() {
        let backend = SimulatedBackend::default();
        let story = write_story(&backend, "a brave little toaster", StorySettings::default())
            .await
            .unwrap();

        assert!(story.contains("a brave little toaster"));
        let scenes = split_scenes(&story).unwrap();
        assert_eq!(scenes.len(), 3);
    }

    #[tokio::test]
    async fn simulated_story_starts_with_hook() {
        let backend = SimulatedBackend::default();
        let settings = StorySettings {
            add_hook: true,
            ..Default::default()
        };
        let story = write_story(&backend, "a kite", settings).await.unwrap();
        assert!(story.starts_with("What if"));
    }

    #[tokio::test]
    async fn write_story_rejects_blank_prompt() {
        let backend = SimulatedBackend::default();
        let err = write_story(&backend, "  ", StorySettings::default())
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::InvalidInput(_));
    }

    #[tokio::test]
    async fn write_story_rejects_invalid_settings() {
        let backend = SimulatedBackend::default();
        let settings = StorySettings {
            duration: 0,
            ..Default::default()
        };
        let err = write_story(&backend, "a fox", settings).await.unwrap_err();
        assert_matches!(err, CoreError::InvalidInput(_));
    }

    #[tokio::test]
    async fn blank_backend_output_is_backend_error() {
        let err = write_story(&BlankBackend, "a fox", StorySettings::default())
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Backend(_));
    }

    #[tokio::test]
    async fn simulated_refinement_has_one_scene_per_group() {
        let draft = "A fox woke. The sun rose. Birds sang. The fox ran. The end came.";
        let settings = StorySettings {
            duration: 60,
            ..Default::default()
        };
        let story = refine_story(&SimulatedBackend::default(), draft, settings)
            .await
            .unwrap();

        assert_eq!(story.scenes.len(), split_scenes(draft).unwrap().len());
        assert_eq!(story.scenes[0].scene_number, 1);
        assert!(story.scenes.iter().all(|s| s.duration_estimate >= 1.0));
        assert!(!story.scenes[0].dialogue_or_narration.is_empty());
        assert_eq!(story.settings.unwrap().duration, 60);
    }

    #[tokio::test]
    async fn refinement_rejects_blank_content() {
        let err = refine_story(&SimulatedBackend::default(), " \n", StorySettings::default())
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::InvalidInput(msg) if msg == "No story content provided");
    }

    #[tokio::test]
    async fn refinement_defaults_to_unsupported() {
        let err = refine_story(&BlankBackend, "A fox ran.", StorySettings::default())
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Backend(msg) if msg.contains("not supported"));
    }

    #[tokio::test]
    async fn assembled_url_uses_base_and_job_id() {
        let backend = SimulatedBackend::new("/videos/");
        let id = new_job_id();
        let result = backend
            .assemble_animation(id, &[], &["a".to_string()])
            .await
            .unwrap();
        assert_eq!(result.animation_url, format!("/videos/{id}"));
        assert_eq!(result.artifacts, vec!["a".to_string()]);
    }

    #[test]
    fn backend_error_converts_to_core_backend() {
        let err: CoreError = BackendError::Timeout(Duration::from_secs(5)).into();
        assert_matches!(err, CoreError::Backend(msg) if msg.contains("timed out"));
    }
}
