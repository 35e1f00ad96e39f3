//! Animation phase plan.
//!
//! A [`PhasePlan`] is the ordered list of named steps every animation job
//! walks through. Each step carries the progress percentage reported once
//! the step is entered and the pause taken after its backend work so that
//! pollers see incremental progress. The plan is shared read-only by all
//! jobs; per-job state lives on the job record.

use std::time::Duration;

use serde::Serialize;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Progress reported when a job completes.
pub const COMPLETE_PROGRESS: u8 = 100;

/// Pause after each default phase.
pub const DEFAULT_PHASE_DELAY: Duration = Duration::from_millis(3000);

/// Default phase names and their target progress.
pub const DEFAULT_PHASES: [(&str, u8); 6] = [
    ("Processing story", 15),
    ("Creating characters", 30),
    ("Building scenes", 45),
    ("Generating animation", 60),
    ("Adding audio", 75),
    ("Final touches", 90),
];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One named step of the animation pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    pub name: String,
    pub target_progress: u8,
    #[serde(skip)]
    pub delay: Duration,
}

impl Phase {
    pub fn new(name: impl Into<String>, target_progress: u8, delay: Duration) -> Self {
        Self {
            name: name.into(),
            target_progress,
            delay,
        }
    }
}

/// Validated, ordered list of phases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhasePlan {
    phases: Vec<Phase>,
}

impl PhasePlan {
    /// Build a plan, rejecting empty lists, targets above 100 and targets
    /// that go backwards.
    pub fn new(phases: Vec<Phase>) -> Result<Self, CoreError> {
        if phases.is_empty() {
            return Err(CoreError::InvalidInput(
                "phase plan must contain at least one phase".to_string(),
            ));
        }

        let mut previous = 0u8;
        for phase in &phases {
            if phase.target_progress > COMPLETE_PROGRESS {
                return Err(CoreError::InvalidInput(format!(
                    "phase '{}' targets {}%, above {COMPLETE_PROGRESS}%",
                    phase.name, phase.target_progress
                )));
            }
            if phase.target_progress < previous {
                return Err(CoreError::InvalidInput(format!(
                    "phase '{}' targets {}%, below the previous phase's {previous}%",
                    phase.name, phase.target_progress
                )));
            }
            previous = phase.target_progress;
        }

        Ok(Self { phases })
    }

    /// The default six-phase plan with the same `delay` after every phase.
    pub fn with_delay(delay: Duration) -> Self {
        let phases = DEFAULT_PHASES
            .iter()
            .map(|(name, target)| Phase::new(*name, *target, delay))
            .collect();
        Self { phases }
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Look up a phase by its 1-based index.
    pub fn get(&self, index: u32) -> Option<&Phase> {
        let position = (index as usize).checked_sub(1)?;
        self.phases.get(position)
    }

    /// Iterate `(1-based index, phase)` pairs in execution order.
    pub fn iter_indexed(&self) -> impl Iterator<Item = (u32, &Phase)> {
        self.phases
            .iter()
            .enumerate()
            .map(|(i, phase)| (i as u32 + 1, phase))
    }
}

impl Default for PhasePlan {
    fn default() -> Self {
        Self::with_delay(DEFAULT_PHASE_DELAY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
