use std::sync::Arc;

use pixarify_pipeline::{GenerationBackend, JobRunner, JobStore, ProgressReporter};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Registry of every retained animation job.
    pub store: Arc<JobStore>,
    /// Submits, starts and cancels jobs.
    pub runner: Arc<JobRunner>,
    /// Read-only progress queries.
    pub reporter: ProgressReporter,
}

impl AppState {
    /// Wire a fresh job store, runner and reporter around `backend`.
    pub fn new(config: ServerConfig, backend: Arc<dyn GenerationBackend>) -> Self {
        let store = Arc::new(JobStore::new());
        let runner = JobRunner::new(
            Arc::clone(&store),
            backend,
            config.jobs.phase_plan(),
            config.jobs.runner_config(),
        );
        let reporter = ProgressReporter::new(Arc::clone(&store));

        Self {
            config: Arc::new(config),
            store,
            runner: Arc::new(runner),
            reporter,
        }
    }
}
