//! Animation job record and its state machine.
//!
//! ```text
//! Pending ──start──▶ Running ──complete──▶ Completed
//!    │                  │
//!    └──────fail────────┴──────fail──────▶ Failed
//! ```
//!
//! `Completed` and `Failed` are terminal: once there, the record never
//! changes again. While `Running`, `progress` and `current_phase` only move
//! forward. A result is present exactly when the job completed and an error
//! exactly when it failed.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::phase::COMPLETE_PROGRESS;
use crate::scene::Scene;
use crate::types::{JobId, Timestamp};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Lifecycle state of an animation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    /// Whether the state machine has an edge from `self` to `next`.
    ///
    /// `Pending -> Failed` exists for jobs cancelled before they start.
    pub fn can_transition_to(self, next: JobState) -> bool {
        matches!(
            (self, next),
            (JobState::Pending, JobState::Running)
                | (JobState::Pending, JobState::Failed)
                | (JobState::Running, JobState::Completed)
                | (JobState::Running, JobState::Failed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// Output of a completed animation job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationResult {
    pub animation_url: String,
    /// References to per-phase artifacts produced along the way.
    #[serde(default)]
    pub artifacts: Vec<String>,
}

/// One animation-generation request tracked through its phases.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub state: JobState,
    pub progress: u8,
    /// 1-based index into the phase plan.
    pub current_phase: u32,
    pub total_phases: u32,
    pub phase_name: Option<String>,
    pub scenes: Vec<Scene>,
    pub settings: serde_json::Value,
    pub result: Option<AnimationResult>,
    pub error: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
}

impl Job {
    /// A fresh `Pending` job with progress 0 at phase 1.
    pub fn new(
        id: JobId,
        scenes: Vec<Scene>,
        settings: serde_json::Value,
        total_phases: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            state: JobState::Pending,
            progress: 0,
            current_phase: 1,
            total_phases,
            phase_name: None,
            scenes,
            settings,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// `Pending -> Running`, resetting progress to the start of phase 1.
    pub fn start(&mut self) -> Result<(), CoreError> {
        self.require_transition(JobState::Running)?;
        self.state = JobState::Running;
        self.progress = 0;
        self.current_phase = 1;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Move a running job to phase `index` with the phase's target progress.
    pub fn advance(
        &mut self,
        index: u32,
        name: impl Into<String>,
        progress: u8,
    ) -> Result<(), CoreError> {
        if self.state != JobState::Running {
            return Err(CoreError::InvalidTransition {
                from: self.state,
                to: JobState::Running,
            });
        }
        if index < self.current_phase {
            return Err(CoreError::InvalidUpdate(format!(
                "phase cannot move backwards from {} to {index}",
                self.current_phase
            )));
        }
        if progress < self.progress {
            return Err(CoreError::InvalidUpdate(format!(
                "progress cannot move backwards from {} to {progress}",
                self.progress
            )));
        }
        self.current_phase = index;
        self.phase_name = Some(name.into());
        self.progress = progress;
        Ok(())
    }

    /// `Running -> Completed` with the final result; progress becomes 100.
    pub fn complete(&mut self, result: AnimationResult) -> Result<(), CoreError> {
        self.require_transition(JobState::Completed)?;
        self.state = JobState::Completed;
        self.progress = COMPLETE_PROGRESS;
        self.result = Some(result);
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// Any non-terminal state `-> Failed`. Progress and phase stay frozen.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), CoreError> {
        self.require_transition(JobState::Failed)?;
        self.state = JobState::Failed;
        self.error = Some(error.into());
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// Check that replacing `self` with `next` respects the state machine.
    ///
    /// Used by the job store to reject arbitrary mutations, not only the
    /// ones made through the transition methods above.
    pub fn validate_update(&self, next: &Job) -> Result<(), CoreError> {
        if next.id != self.id {
            return Err(CoreError::InvalidUpdate("job id cannot change".to_string()));
        }
        if next.scenes != self.scenes {
            return Err(CoreError::InvalidUpdate(
                "job scenes are fixed at creation".to_string(),
            ));
        }

        if self.is_terminal() {
            if next == self {
                return Ok(());
            }
            return Err(CoreError::InvalidTransition {
                from: self.state,
                to: next.state,
            });
        }

        if next.state != self.state && !self.state.can_transition_to(next.state) {
            return Err(CoreError::InvalidTransition {
                from: self.state,
                to: next.state,
            });
        }

        if self.state == JobState::Running {
            if next.progress < self.progress {
                return Err(CoreError::InvalidUpdate(format!(
                    "progress cannot move backwards from {} to {}",
                    self.progress, next.progress
                )));
            }
            if next.current_phase < self.current_phase {
                return Err(CoreError::InvalidUpdate(format!(
                    "phase cannot move backwards from {} to {}",
                    self.current_phase, next.current_phase
                )));
            }
        }

        if next.progress > COMPLETE_PROGRESS {
            return Err(CoreError::InvalidUpdate(format!(
                "progress {} exceeds {COMPLETE_PROGRESS}",
                next.progress
            )));
        }
        if next.current_phase == 0 || next.current_phase > next.total_phases.max(1) {
            return Err(CoreError::InvalidUpdate(format!(
                "phase {} outside 1..={}",
                next.current_phase, next.total_phases
            )));
        }
        if next.result.is_some() != (next.state == JobState::Completed) {
            return Err(CoreError::InvalidUpdate(
                "result must be present exactly when the job is completed".to_string(),
            ));
        }
        if next.error.is_some() != (next.state == JobState::Failed) {
            return Err(CoreError::InvalidUpdate(
                "error must be present exactly when the job has failed".to_string(),
            ));
        }

        Ok(())
    }

    fn require_transition(&self, to: JobState) -> Result<(), CoreError> {
        if self.state.can_transition_to(to) {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition {
                from: self.state,
                to,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
