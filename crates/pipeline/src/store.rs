//! In-process job registry.
//!
//! Each job lives in its own [`watch`] channel. Writers go through
//! [`watch::Sender::send_if_modified`], which serializes updates to one job
//! and swaps in the new record whole, so readers always clone a complete
//! snapshot. The id map itself is behind a [`RwLock`] that is only held for
//! lookups, inserts and eviction, never across a job update.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use pixarify_core::error::CoreError;
use pixarify_core::job::Job;
use pixarify_core::scene::Scene;
use pixarify_core::types::{new_job_id, JobId, Timestamp};
use tokio::sync::{watch, RwLock};
use tokio_util::sync::CancellationToken;

/// A job record plus the handle used to abort its task.
struct JobEntry {
    tx: watch::Sender<Job>,
    cancel: CancellationToken,
}

#[derive(Default)]
struct Inner {
    jobs: HashMap<JobId, Arc<JobEntry>>,
    /// Most recently created job, for the legacy global progress view.
    latest: Option<JobId>,
}

/// Process-wide registry of job state keyed by job id.
///
/// Designed to be wrapped in `Arc` and shared between the runner, the
/// progress reporter and the retention sweeper.
#[derive(Default)]
pub struct JobStore {
    inner: RwLock<Inner>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new `Pending` job and return it.
    pub async fn create(
        &self,
        scenes: Vec<Scene>,
        settings: serde_json::Value,
        total_phases: u32,
    ) -> Job {
        let job = Job::new(new_job_id(), scenes, settings, total_phases);
        let (tx, _rx) = watch::channel(job.clone());
        let entry = Arc::new(JobEntry {
            tx,
            cancel: CancellationToken::new(),
        });

        let mut inner = self.inner.write().await;
        inner.jobs.insert(job.id, entry);
        inner.latest = Some(job.id);

        tracing::debug!(job_id = %job.id, scenes = job.scenes.len(), "Job created");
        job
    }

    /// Current snapshot of a job, if it exists.
    pub async fn get(&self, id: JobId) -> Option<Job> {
        let entry = self.inner.read().await.jobs.get(&id).cloned()?;
        let job = entry.tx.borrow().clone();
        Some(job)
    }

    /// Snapshot of the most recently created job that is still retained.
    pub async fn latest(&self) -> Option<Job> {
        let entry = {
            let inner = self.inner.read().await;
            let id = inner.latest?;
            inner.jobs.get(&id).cloned()?
        };
        let job = entry.tx.borrow().clone();
        Some(job)
    }

    /// Apply `mutator` to a job atomically.
    ///
    /// The mutator works on a copy. The copy replaces the stored record only
    /// if the mutator succeeds and the result passes
    /// [`Job::validate_update`]; otherwise the stored job is untouched and
    /// the error is returned. Returns the new snapshot.
    pub async fn update<F>(&self, id: JobId, mutator: F) -> Result<Job, CoreError>
    where
        F: FnOnce(&mut Job) -> Result<(), CoreError>,
    {
        let entry = self.entry(id).await?;

        let mut outcome = Err(CoreError::Internal(format!(
            "update of job {id} did not run"
        )));
        entry.tx.send_if_modified(|current| {
            let mut next = current.clone();
            if let Err(e) = mutator(&mut next).and_then(|()| current.validate_update(&next)) {
                outcome = Err(e);
                return false;
            }
            if next == *current {
                outcome = Ok(next);
                return false;
            }
            next.updated_at = Utc::now();
            *current = next.clone();
            outcome = Ok(next);
            true
        });
        outcome
    }

    /// Subscribe to changes of one job.
    pub async fn watch(&self, id: JobId) -> Result<watch::Receiver<Job>, CoreError> {
        Ok(self.entry(id).await?.tx.subscribe())
    }

    /// The cancellation token stored alongside the job.
    pub async fn cancel_token(&self, id: JobId) -> Result<CancellationToken, CoreError> {
        Ok(self.entry(id).await?.cancel.clone())
    }

    /// Drop terminal jobs that finished before `cutoff`.
    ///
    /// Pending and running jobs are never evicted. Returns how many jobs
    /// were removed.
    pub async fn evict_finished_before(&self, cutoff: Timestamp) -> usize {
        let mut inner = self.inner.write().await;
        let before = inner.jobs.len();

        inner.jobs.retain(|_, entry| {
            let job = entry.tx.borrow();
            !(job.is_terminal() && job.finished_at.is_some_and(|at| at < cutoff))
        });

        if let Some(latest) = inner.latest {
            if !inner.jobs.contains_key(&latest) {
                inner.latest = None;
            }
        }

        before - inner.jobs.len()
    }

    /// Number of retained jobs.
    pub async fn len(&self) -> usize {
        self.inner.read().await.jobs.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn entry(&self, id: JobId) -> Result<Arc<JobEntry>, CoreError> {
        self.inner
            .read()
            .await
            .jobs
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::job_not_found(id))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
