//! Job runner: submission, start, cancellation, and phase execution.
//!
//! `start` flips a job to `Running` and spawns one tokio task for it. The
//! task walks the phase plan strictly in order: record the phase in the
//! store, call the backend, pause for the phase delay. A backend error,
//! a timeout, or cancellation fails the job on the spot and skips the
//! remaining phases. Nothing that happens inside the task is returned to
//! the caller of `start`; it is only visible through the job record.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use pixarify_core::error::CoreError;
use pixarify_core::job::{Job, JobState};
use pixarify_core::phase::PhasePlan;
use pixarify_core::scene::{split_scenes, Scene};
use pixarify_core::types::JobId;
use tokio_util::sync::CancellationToken;

use crate::backend::{BackendError, GenerationBackend, PhaseRequest};
use crate::store::JobStore;

/// Error message stored on jobs stopped through [`JobRunner::cancel`].
pub const CANCELLED_MESSAGE: &str = "cancelled";

/// Default upper bound on a single backend call.
pub const DEFAULT_PHASE_TIMEOUT: Duration = Duration::from_secs(60);

/// Runner tuning knobs.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Maximum time one backend call may take before the job fails.
    pub phase_timeout: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            phase_timeout: DEFAULT_PHASE_TIMEOUT,
        }
    }
}

/// Drives animation jobs through the phase plan.
///
/// Cheap to share behind `Arc`; every started job gets its own task.
pub struct JobRunner {
    store: Arc<JobStore>,
    backend: Arc<dyn GenerationBackend>,
    plan: Arc<PhasePlan>,
    config: RunnerConfig,
}

impl JobRunner {
    pub fn new(
        store: Arc<JobStore>,
        backend: Arc<dyn GenerationBackend>,
        plan: PhasePlan,
        config: RunnerConfig,
    ) -> Self {
        Self {
            store,
            backend,
            plan: Arc::new(plan),
            config,
        }
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    pub fn backend(&self) -> &Arc<dyn GenerationBackend> {
        &self.backend
    }

    pub fn plan(&self) -> &PhasePlan {
        &self.plan
    }

    /// Split `story` into scenes and create a `Pending` job for them.
    pub async fn submit(&self, story: &str, settings: serde_json::Value) -> Result<Job, CoreError> {
        let scenes = split_scenes(story)?;
        self.submit_scenes(scenes, settings).await
    }

    /// Create a `Pending` job for scenes the caller already has.
    pub async fn submit_scenes(
        &self,
        scenes: Vec<Scene>,
        settings: serde_json::Value,
    ) -> Result<Job, CoreError> {
        if scenes.is_empty() {
            return Err(CoreError::InvalidInput(
                "Valid scenes array is required".to_string(),
            ));
        }

        let job = self
            .store
            .create(scenes, settings, self.plan.len() as u32)
            .await;
        tracing::info!(job_id = %job.id, scenes = job.scenes.len(), "Animation job submitted");
        Ok(job)
    }

    /// Move a `Pending` job to `Running` and spawn its task.
    ///
    /// Returns as soon as the task is spawned.
    pub async fn start(&self, id: JobId) -> Result<Job, CoreError> {
        let job = self.store.update(id, Job::start).await?;
        let cancel = self.store.cancel_token(id).await?;

        let task = JobTask {
            job_id: id,
            store: Arc::clone(&self.store),
            backend: Arc::clone(&self.backend),
            plan: Arc::clone(&self.plan),
            phase_timeout: self.config.phase_timeout,
            cancel,
        };
        spawn_supervised(Arc::clone(&self.store), task);

        tracing::info!(job_id = %id, phases = self.plan.len(), "Animation job started");
        Ok(job)
    }

    /// Submit and immediately start a job for `story`.
    pub async fn submit_and_start(
        &self,
        story: &str,
        settings: serde_json::Value,
    ) -> Result<Job, CoreError> {
        let job = self.submit(story, settings).await?;
        self.start(job.id).await
    }

    /// Fail a pending or running job and stop its task.
    ///
    /// Fails with `InvalidTransition` when the job is already terminal.
    pub async fn cancel(&self, id: JobId) -> Result<Job, CoreError> {
        let job = self
            .store
            .get(id)
            .await
            .ok_or_else(|| CoreError::job_not_found(id))?;
        if job.is_terminal() {
            return Err(CoreError::InvalidTransition {
                from: job.state,
                to: JobState::Failed,
            });
        }

        self.store.cancel_token(id).await?.cancel();
        let job = self
            .store
            .update(id, |job| job.fail(CANCELLED_MESSAGE))
            .await?;

        tracing::info!(job_id = %id, phase = job.current_phase, "Animation job cancelled");
        Ok(job)
    }
}

// ---------------------------------------------------------------------------
// Job task
// ---------------------------------------------------------------------------

/// Why a job task stopped before completing.
#[derive(Debug)]
enum RunError {
    Backend(BackendError),
    Cancelled,
    /// The store refused an update, normally because the job was already
    /// made terminal by someone else (cancellation).
    Rejected(CoreError),
}

/// Everything one job's task needs, owned so the task is `'static`.
struct JobTask {
    job_id: JobId,
    store: Arc<JobStore>,
    backend: Arc<dyn GenerationBackend>,
    plan: Arc<PhasePlan>,
    phase_timeout: Duration,
    cancel: CancellationToken,
}

/// Spawn the job task plus a watcher that fails the job if the task panics.
fn spawn_supervised(store: Arc<JobStore>, task: JobTask) {
    let job_id = task.job_id;
    let handle = tokio::spawn(task.run());

    tokio::spawn(async move {
        if let Err(e) = handle.await {
            tracing::error!(job_id = %job_id, error = %e, "Animation job task aborted");
            let message = format!("internal error: {e}");
            if let Err(e) = store.update(job_id, |job| job.fail(message)).await {
                tracing::debug!(job_id = %job_id, error = %e, "Job already terminal after abort");
            }
        }
    });
}

impl JobTask {
    async fn run(self) {
        let job_id = self.job_id;

        let message = match self.execute().await {
            Ok(()) => {
                tracing::info!(job_id = %job_id, "Animation job completed");
                return;
            }
            Err(RunError::Rejected(e)) => {
                tracing::info!(job_id = %job_id, reason = %e, "Animation job stopped");
                return;
            }
            Err(RunError::Cancelled) => CANCELLED_MESSAGE.to_string(),
            Err(RunError::Backend(e)) => {
                tracing::error!(job_id = %job_id, error = %e, "Animation job failed");
                CoreError::from(e).to_string()
            }
        };

        if let Err(e) = self.store.update(job_id, |job| job.fail(message)).await {
            tracing::debug!(job_id = %job_id, error = %e, "Job already terminal");
        }
    }

    async fn execute(&self) -> Result<(), RunError> {
        let job_id = self.job_id;
        let snapshot = self
            .store
            .get(job_id)
            .await
            .ok_or_else(|| RunError::Rejected(CoreError::job_not_found(job_id)))?;

        let mut artifacts = Vec::new();
        for (index, phase) in self.plan.iter_indexed() {
            self.store
                .update(job_id, |job| {
                    job.advance(index, phase.name.clone(), phase.target_progress)
                })
                .await
                .map_err(RunError::Rejected)?;
            tracing::debug!(
                job_id = %job_id,
                phase = index,
                phase_name = %phase.name,
                progress = phase.target_progress,
                "Phase entered",
            );

            let request = PhaseRequest {
                job_id,
                index,
                phase,
                scenes: &snapshot.scenes,
                settings: &snapshot.settings,
            };
            if let Some(artifact) = self
                .guarded(self.backend.generate_phase_artifact(request))
                .await?
            {
                artifacts.push(artifact);
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(RunError::Cancelled),
                _ = tokio::time::sleep(phase.delay) => {}
            }
        }

        let result = self
            .guarded(
                self.backend
                    .assemble_animation(job_id, &snapshot.scenes, &artifacts),
            )
            .await?;
        self.store
            .update(job_id, move |job| job.complete(result))
            .await
            .map_err(RunError::Rejected)?;
        Ok(())
    }

    /// Run one backend call under the phase timeout and the job's
    /// cancellation token.
    async fn guarded<T>(
        &self,
        work: impl Future<Output = Result<T, BackendError>>,
    ) -> Result<T, RunError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(RunError::Cancelled),
            outcome = tokio::time::timeout(self.phase_timeout, work) => match outcome {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(e)) => Err(RunError::Backend(e)),
                Err(_) => Err(RunError::Backend(BackendError::Timeout(self.phase_timeout))),
            },
        }
    }
}
