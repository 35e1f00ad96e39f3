//! Animation job pipeline.
//!
//! [`JobStore`] keeps every job keyed by id, [`JobRunner`] drives a job
//! through the phase plan on its own tokio task, and [`ProgressReporter`]
//! is the read-only view polling clients use. The actual generation work
//! is behind the [`GenerationBackend`] trait.

pub mod backend;
pub mod progress;
pub mod runner;
pub mod store;

pub use backend::{BackendError, GenerationBackend, SimulatedBackend};
pub use progress::{LegacyProgress, ProgressReporter, ProgressSnapshot};
pub use runner::{JobRunner, RunnerConfig};
pub use store::JobStore;
