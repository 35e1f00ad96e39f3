//! Pixarify domain core.
//!
//! Pure types and logic shared by the pipeline and API crates: the error
//! taxonomy, scene splitting, the phase plan, the job state machine, and
//! story prompt construction. Nothing in here performs I/O.

pub mod error;
pub mod job;
pub mod phase;
pub mod scene;
pub mod story;
pub mod types;
