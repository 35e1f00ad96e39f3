//! Story settings and prompt construction.
//!
//! The generation backend receives a fully built instruction text, so the
//! prompt rules (scene count and complexity scaled by narration length,
//! optional opening hook) live here and stay vendor-neutral. So does the
//! parsing of refined stories, which backends return as JSON embedded in
//! free text.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Minimum number of scenes recommended for any story.
pub const MIN_RECOMMENDED_SCENES: u32 = 5;

/// Seconds of narration covered by one recommended scene.
pub const SECONDS_PER_SCENE: u32 = 10;

/// Allowed narration length in seconds.
pub const MIN_DURATION_SECS: u32 = 5;
pub const MAX_DURATION_SECS: u32 = 600;

/// Maximum prompt length accepted from clients.
pub const MAX_PROMPT_LEN: usize = 2000;

/// Narration pace used for word targets, in words per ten seconds.
const WORDS_PER_TEN_SECONDS: u32 = 25;

/// A ```json (or bare ```) fenced block holding a single object.
static FENCED_JSON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```(?:json)?\s*(\{[\s\S]*?\})\s*```").expect("valid regex")
});

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Client-chosen story settings. Missing fields take the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct StorySettings {
    #[validate(length(min = 1, max = 64))]
    pub emotion: String,
    #[validate(length(min = 1, max = 64))]
    pub language: String,
    #[validate(length(min = 1, max = 64))]
    pub voice_style: String,
    /// Narration length in seconds.
    #[validate(range(min = 5, max = 600))]
    pub duration: u32,
    pub add_hook: bool,
}

impl Default for StorySettings {
    fn default() -> Self {
        Self {
            emotion: "happy".to_string(),
            language: "English".to_string(),
            voice_style: "friendly".to_string(),
            duration: 30,
            add_hook: false,
        }
    }
}

impl StorySettings {
    /// Run field validation, mapping failures to [`CoreError::InvalidInput`].
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate()
            .map_err(|e| CoreError::InvalidInput(format!("invalid story settings: {e}")))
    }
}

/// How elaborate the story should be for a given narration length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryComplexity {
    Simple,
    Moderate,
    Detailed,
    Complex,
}

impl StoryComplexity {
    pub fn as_str(self) -> &'static str {
        match self {
            StoryComplexity::Simple => "simple",
            StoryComplexity::Moderate => "moderate",
            StoryComplexity::Detailed => "detailed",
            StoryComplexity::Complex => "complex",
        }
    }
}

// ---------------------------------------------------------------------------
// Prompt rules
// ---------------------------------------------------------------------------

/// `floor(duration * 2.5)` words of narration.
pub fn target_word_count(duration_secs: u32) -> u32 {
    duration_secs * WORDS_PER_TEN_SECONDS / 10
}

/// `max(5, ceil(duration / 10))` scenes.
pub fn recommended_scene_count(duration_secs: u32) -> u32 {
    duration_secs
        .div_ceil(SECONDS_PER_SCENE)
        .max(MIN_RECOMMENDED_SCENES)
}

pub fn story_complexity(duration_secs: u32) -> StoryComplexity {
    match duration_secs {
        0..=30 => StoryComplexity::Simple,
        31..=60 => StoryComplexity::Moderate,
        61..=90 => StoryComplexity::Detailed,
        _ => StoryComplexity::Complex,
    }
}

/// Validate a raw story prompt, returning it trimmed.
pub fn validate_prompt(prompt: &str) -> Result<&str, CoreError> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidInput("Prompt is required".to_string()));
    }
    if trimmed.chars().count() > MAX_PROMPT_LEN {
        return Err(CoreError::InvalidInput(format!(
            "Prompt must be at most {MAX_PROMPT_LEN} characters"
        )));
    }
    Ok(trimmed)
}

/// Build the instruction text sent to the generation backend.
pub fn build_story_prompt(prompt: &str, settings: &StorySettings) -> String {
    let scenes = recommended_scene_count(settings.duration);
    let complexity = story_complexity(settings.duration);
    let words = target_word_count(settings.duration);

    let mut text = format!(
        "Write a short children's story about: {prompt}\n\
         \n\
         The story should convey the emotion: {emotion}\n\
         Language style should be: {language}\n\
         Voice style should be: {voice}\n\
         Approximate story length for {duration} seconds of narration \
         (about {words} words), told in about {scenes} distinct scenes.\n\
         Story complexity should be {complexity}.\n",
        emotion = settings.emotion,
        language = settings.language,
        voice = settings.voice_style,
        duration = settings.duration,
        complexity = complexity.as_str(),
    );
    if settings.add_hook {
        text.push_str("Include a strong hook at the beginning.\n");
    }
    text.push_str(
        "\nThe story should be engaging, imaginative, and appropriate for children. \
         End every sentence with '.', '?' or '!'.",
    );
    text
}

// ---------------------------------------------------------------------------
// Refined stories
// ---------------------------------------------------------------------------

/// Screenplay-style story produced by refinement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefinedStory {
    pub title: String,
    #[serde(default)]
    pub logline: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<StorySettings>,
    #[serde(default)]
    pub characters: Vec<StoryCharacter>,
    pub scenes: Vec<RefinedScene>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryCharacter {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefinedScene {
    pub scene_number: u32,
    /// Seconds; backends sometimes answer with fractions.
    #[serde(default)]
    pub duration_estimate: f64,
    #[serde(default)]
    pub visual_description: String,
    #[serde(default)]
    pub dialogue_or_narration: String,
}

/// Build the instruction text for turning `content` into a [`RefinedStory`].
pub fn build_refine_prompt(content: &str, settings: &StorySettings) -> String {
    let scenes = recommended_scene_count(settings.duration);
    let complexity = story_complexity(settings.duration);
    let words = target_word_count(settings.duration);

    let mut text = format!(
        "Create a \"{emotion}\" story based on this prompt: \"{content}\" \
         with approximately {words} words.\n\
         \n\
         Tailor it to {duration} seconds of narration in {language} with a \
         {voice} voice. Create approximately {scenes} distinct scenes of \
         10-15 seconds each, one activity per scene. \
         Story complexity should be {complexity}.\n",
        emotion = settings.emotion,
        language = settings.language,
        voice = settings.voice_style,
        duration = settings.duration,
        complexity = complexity.as_str(),
    );
    if settings.add_hook {
        text.push_str("Include a compelling hook in the opening scene.\n");
    }
    text.push_str(
        "\nReturn ONLY JSON of the form {\"title\", \"logline\", \"settings\", \
         \"characters\": [{\"name\", \"description\"}], \"scenes\": [{\"sceneNumber\", \
         \"durationEstimate\", \"visualDescription\", \"dialogueOrNarration\"}]}.",
    );
    text
}

/// Locate the JSON object inside backend output.
///
/// Prefers a fenced code block; otherwise takes everything from the first
/// `{` to the last `}`. Returns the whole text when neither is present.
pub fn extract_json_block(raw: &str) -> &str {
    if let Some(inner) = FENCED_JSON_RE.captures(raw).and_then(|c| c.get(1)) {
        return inner.as_str();
    }
    match (raw.find('{'), raw.rfind('}')) {
        (Some(first), Some(last)) if last > first => &raw[first..=last],
        _ => raw,
    }
}

/// Parse backend output into a [`RefinedStory`].
///
/// Fails with [`CoreError::MalformedStory`] carrying the untouched output.
pub fn parse_refined_story(raw: &str) -> Result<RefinedStory, CoreError> {
    serde_json::from_str(extract_json_block(raw)).map_err(|e| CoreError::MalformedStory {
        reason: e.to_string(),
        raw: raw.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn scene_count_has_floor_of_five() {
        assert_eq!(recommended_scene_count(5), 5);
        assert_eq!(recommended_scene_count(30), 5);
        assert_eq!(recommended_scene_count(50), 5);
    }

    #[test]
    fn scene_count_rounds_up_for_long_stories() {
        assert_eq!(recommended_scene_count(61), 7);
        assert_eq!(recommended_scene_count(120), 12);
    }

    #[test]
    fn complexity_bands() {
        assert_eq!(story_complexity(30), StoryComplexity::Simple);
        assert_eq!(story_complexity(31), StoryComplexity::Moderate);
        assert_eq!(story_complexity(60), StoryComplexity::Moderate);
        assert_eq!(story_complexity(90), StoryComplexity::Detailed);
        assert_eq!(story_complexity(91), StoryComplexity::Complex);
    }

    #[test]
    fn default_settings_are_valid() {
        assert!(StorySettings::default().check().is_ok());
    }

    #[test]
    fn rejects_out_of_range_duration() {
        let settings = StorySettings {
            duration: 4,
            ..Default::default()
        };
        assert_matches!(settings.check(), Err(CoreError::InvalidInput(_)));

        let settings = StorySettings {
            duration: MAX_DURATION_SECS + 1,
            ..Default::default()
        };
        assert_matches!(settings.check(), Err(CoreError::InvalidInput(_)));
    }

    #[test]
    fn rejects_empty_emotion() {
        let settings = StorySettings {
            emotion: String::new(),
            ..Default::default()
        };
        assert_matches!(settings.check(), Err(CoreError::InvalidInput(_)));
    }

    #[test]
    fn partial_settings_fill_defaults() {
        let settings: StorySettings =
            serde_json::from_str(r#"{"emotion":"brave","addHook":true}"#).unwrap();
        assert_eq!(settings.emotion, "brave");
        assert!(settings.add_hook);
        assert_eq!(settings.duration, 30);
        assert_eq!(settings.voice_style, "friendly");
    }

    #[test]
    fn prompt_validation_trims_and_rejects_blank() {
        assert_eq!(validate_prompt("  a fox  ").unwrap(), "a fox");
        assert_matches!(validate_prompt("   "), Err(CoreError::InvalidInput(_)));
        let long = "x".repeat(MAX_PROMPT_LEN + 1);
        assert_matches!(validate_prompt(&long), Err(CoreError::InvalidInput(_)));
    }

    #[test]
    fn prompt_mentions_settings() {
        let settings = StorySettings {
            emotion: "curious".into(),
            duration: 120,
            ..Default::default()
        };
        let prompt = build_story_prompt("a lost robot", &settings);
        assert!(prompt.contains("a lost robot"));
        assert!(prompt.contains("curious"));
        assert!(prompt.contains("about 12 distinct scenes"));
        assert!(prompt.contains("complexity should be complex"));
        assert!(!prompt.contains("hook"));
    }

    #[test]
    fn prompt_includes_hook_when_requested() {
        let settings = StorySettings {
            add_hook: true,
            ..Default::default()
        };
        assert!(build_story_prompt("a dragon", &settings).contains("strong hook"));
    }

    #[test]
    fn word_target_is_two_and_a_half_per_second() {
        assert_eq!(target_word_count(30), 75);
        assert_eq!(target_word_count(5), 12);
        assert_eq!(target_word_count(61), 152);
    }

    #[test]
    fn prompts_carry_word_target() {
        let settings = StorySettings::default();
        assert!(build_story_prompt("a fox", &settings).contains("about 75 words"));
        assert!(build_refine_prompt("a fox", &settings).contains("approximately 75 words"));
    }

    // -- refined story parsing --

    const STORY_JSON: &str = r#"{
        "title": "Pip's Big Day",
        "logline": "A sparrow learns to fly.",
        "characters": [{ "name": "Pip", "description": "A tiny sparrow" }],
        "scenes": [
            { "sceneNumber": 1, "durationEstimate": 10,
              "visualDescription": "A nest at dawn", "dialogueOrNarration": "Pip woke up." }
        ]
    }"#;

    #[test]
    fn parses_fenced_json() {
        let raw = format!("Here you go!\n```json\n{STORY_JSON}\n```\nEnjoy.");
        let story = parse_refined_story(&raw).unwrap();
        assert_eq!(story.title, "Pip's Big Day");
        assert_eq!(story.characters[0].name, "Pip");
        assert_eq!(story.scenes[0].scene_number, 1);
        assert_eq!(story.scenes[0].dialogue_or_narration, "Pip woke up.");
    }

    #[test]
    fn parses_bare_braces_inside_prose() {
        let raw = format!("Sure, the story is {STORY_JSON} and that is all.");
        let story = parse_refined_story(&raw).unwrap();
        assert_eq!(story.logline, "A sparrow learns to fly.");
        assert!(story.settings.is_none());
    }

    #[test]
    fn fence_without_language_tag_is_accepted() {
        let raw = format!("```\n{STORY_JSON}\n```");
        assert_eq!(extract_json_block(&raw).trim_start().chars().next(), Some('{'));
        assert!(parse_refined_story(&raw).is_ok());
    }

    #[test]
    fn garbage_is_malformed_and_keeps_raw_output() {
        let raw = "I'm sorry, I can't write that story.";
        let err = parse_refined_story(raw).unwrap_err();
        assert_matches!(err, CoreError::MalformedStory { raw: kept, .. } if kept == raw);
    }

    #[test]
    fn object_missing_scenes_is_malformed() {
        assert_matches!(
            parse_refined_story(r#"{"title": "No scenes"}"#),
            Err(CoreError::MalformedStory { .. })
        );
    }
}
