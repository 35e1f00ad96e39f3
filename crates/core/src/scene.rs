//! Scene splitting: story text to an ordered list of scenes.
//!
//! Sentences are cut on `.`, `?` and `!`, trimmed, and grouped into scenes
//! of [`DEFAULT_SENTENCES_PER_SCENE`] sentences. Once [`DEFAULT_MAX_SCENES`]
//! is reached the last scene absorbs every remaining sentence, so no input
//! sentence is ever dropped.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Sentences grouped into one scene.
pub const DEFAULT_SENTENCES_PER_SCENE: usize = 2;

/// Upper bound on scenes produced from a single story.
pub const DEFAULT_MAX_SCENES: usize = 6;

/// Characters that end a sentence.
pub const SENTENCE_TERMINATORS: [char; 3] = ['.', '?', '!'];

/// Placeholder image reference template; `{n}` is the 1-based scene number.
const PLACEHOLDER_IMAGE_TEMPLATE: &str = "https://source.unsplash.com/random/500x400?animation={n}";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One narrative beat of a story, paired with a visual reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: String,
    pub text: String,
    #[serde(alias = "image", default)]
    pub image_ref: String,
}

/// Grouping knobs for [`split_scenes_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitOptions {
    pub sentences_per_scene: usize,
    pub max_scenes: usize,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            sentences_per_scene: DEFAULT_SENTENCES_PER_SCENE,
            max_scenes: DEFAULT_MAX_SCENES,
        }
    }
}

// ---------------------------------------------------------------------------
// Splitting
// ---------------------------------------------------------------------------

/// Split `story` into scenes using the default grouping.
pub fn split_scenes(story: &str) -> Result<Vec<Scene>, CoreError> {
    split_scenes_with(story, &SplitOptions::default())
}

/// Split `story` into scenes using explicit grouping options.
///
/// Fails with [`CoreError::InvalidInput`] when the text is blank, has no
/// sentence terminator, or contains only empty fragments.
pub fn split_scenes_with(story: &str, options: &SplitOptions) -> Result<Vec<Scene>, CoreError> {
    if options.sentences_per_scene == 0 || options.max_scenes == 0 {
        return Err(CoreError::InvalidInput(
            "sentences_per_scene and max_scenes must both be at least 1".to_string(),
        ));
    }
    if story.trim().is_empty() {
        return Err(CoreError::InvalidInput("Story is required".to_string()));
    }
    if !story.contains(&SENTENCE_TERMINATORS[..]) {
        return Err(CoreError::InvalidInput(
            "Story must contain at least one sentence ending in '.', '?' or '!'".to_string(),
        ));
    }

    let sentences = split_sentences(story);
    if sentences.is_empty() {
        return Err(CoreError::InvalidInput(
            "Story does not contain any sentences".to_string(),
        ));
    }

    let per_scene = options.sentences_per_scene;
    let scene_count = sentences.len().div_ceil(per_scene).min(options.max_scenes);

    let scenes = (0..scene_count)
        .map(|index| {
            let start = index * per_scene;
            let end = if index + 1 == scene_count {
                sentences.len()
            } else {
                start + per_scene
            };
            Scene {
                id: format!("scene-{}", index + 1),
                text: join_sentences(&sentences[start..end]),
                image_ref: placeholder_image_ref(index),
            }
        })
        .collect();

    Ok(scenes)
}

/// Break text into trimmed, non-empty sentences without their terminators.
pub fn split_sentences(text: &str) -> Vec<&str> {
    text.split(&SENTENCE_TERMINATORS[..])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Deterministic image placeholder for the scene at `index` (0-based).
pub fn placeholder_image_ref(index: usize) -> String {
    PLACEHOLDER_IMAGE_TEMPLATE.replace("{n}", &(index + 1).to_string())
}

fn join_sentences(sentences: &[&str]) -> String {
    let mut text = sentences.join(". ");
    text.push('.');
    text
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
