//! Periodic eviction of finished animation jobs.
//!
//! Completed and failed jobs stay queryable for the retention period after
//! they finish, then the sweeper drops them from the [`JobStore`]. Pending
//! and running jobs are never touched.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use pixarify_pipeline::JobStore;
use tokio_util::sync::CancellationToken;

/// Evict every terminal job that finished more than `retention` ago.
pub async fn sweep_once(store: &JobStore, retention: Duration) -> usize {
    // A retention too large to represent means nothing is ever old enough.
    let cutoff = chrono::Duration::from_std(retention)
        .ok()
        .and_then(|retention| Utc::now().checked_sub_signed(retention));
    match cutoff {
        Some(cutoff) => store.evict_finished_before(cutoff).await,
        None => 0,
    }
}

/// Run the retention loop until `cancel` is triggered.
pub async fn run(
    store: Arc<JobStore>,
    retention: Duration,
    sweep_interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        retention_secs = retention.as_secs(),
        interval_secs = sweep_interval.as_secs(),
        "Job retention sweeper started"
    );

    let mut interval = tokio::time::interval(sweep_interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Job retention sweeper stopping");
                break;
            }
            _ = interval.tick() => {
                let evicted = sweep_once(&store, retention).await;
                if evicted > 0 {
                    tracing::info!(evicted, "Job retention: evicted finished jobs");
                } else {
                    tracing::debug!("Job retention: nothing to evict");
                }
            }
        }
    }
}
