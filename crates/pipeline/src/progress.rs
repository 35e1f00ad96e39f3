//! Read-only progress view for polling clients.

use std::sync::Arc;

use pixarify_core::error::CoreError;
use pixarify_core::job::{AnimationResult, Job, JobState};
use pixarify_core::scene::Scene;
use pixarify_core::types::JobId;
use serde::Serialize;

use crate::store::JobStore;

/// Projection of one job's current record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub job_id: JobId,
    pub state: JobState,
    pub progress: u8,
    pub current_phase: u32,
    pub total_phases: u32,
    pub phase_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnimationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&Job> for ProgressSnapshot {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.id,
            state: job.state,
            progress: job.progress,
            current_phase: job.current_phase,
            total_phases: job.total_phases,
            phase_name: job.phase_name.clone(),
            result: job.result.clone(),
            error: job.error.clone(),
        }
    }
}

/// Shape of the single global progress record older clients poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyProgress {
    pub progress: u8,
    pub current_step: u32,
    pub is_complete: bool,
    pub scenes: Vec<Scene>,
}

impl LegacyProgress {
    /// Record reported before any job exists.
    pub fn initial() -> Self {
        Self {
            progress: 0,
            current_step: 1,
            is_complete: false,
            scenes: Vec::new(),
        }
    }
}

impl From<&Job> for LegacyProgress {
    fn from(job: &Job) -> Self {
        Self {
            progress: job.progress,
            current_step: job.current_phase,
            is_complete: job.state == JobState::Completed,
            scenes: job.scenes.clone(),
        }
    }
}

/// Query surface over the [`JobStore`].
#[derive(Clone)]
pub struct ProgressReporter {
    store: Arc<JobStore>,
}

impl ProgressReporter {
    pub fn new(store: Arc<JobStore>) -> Self {
        Self { store }
    }

    /// Current snapshot of job `id`.
    pub async fn query(&self, id: JobId) -> Result<ProgressSnapshot, CoreError> {
        self.store
            .get(id)
            .await
            .map(|job| ProgressSnapshot::from(&job))
            .ok_or_else(|| CoreError::job_not_found(id))
    }

    /// Legacy view of the most recently submitted job.
    pub async fn latest_legacy(&self) -> LegacyProgress {
        self.store
            .latest()
            .await
            .map(|job| LegacyProgress::from(&job))
            .unwrap_or_else(LegacyProgress::initial)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
