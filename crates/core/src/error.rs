use crate::job::JobState;
use crate::types::JobId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: JobId },

    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: JobState, to: JobState },

    /// The update stays within a legal state but breaks a job invariant
    /// (progress going backwards, result on a failed job, ...).
    #[error("Invalid update: {0}")]
    InvalidUpdate(String),

    #[error("Backend error: {0}")]
    Backend(String),

    /// Backend output that should have held a structured story but did not
    /// parse. `raw` keeps the full output for diagnostics.
    #[error("Malformed story: {reason}")]
    MalformedStory { reason: String, raw: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for the only entity the core currently looks up.
    pub fn job_not_found(id: JobId) -> Self {
        CoreError::NotFound { entity: "Job", id }
    }

    /// `true` for both flavours of state-machine violation.
    pub fn is_transition_error(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidTransition { .. } | CoreError::InvalidUpdate(_)
        )
    }
}
