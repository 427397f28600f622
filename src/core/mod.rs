//! Core domain models for varsep.
//!
//! Variables, separation results, and queue jobs. These are pure domain
//! models with no I/O dependencies.

pub mod job;
pub mod variable;

pub use job::{JobProgress, JobStatus, QueueItem, QueueJob, QueueStats};
pub use variable::{SeparationResult, Span, Variable};

/// Returns the current Unix timestamp in seconds.
#[allow(clippy::cast_possible_wrap)]
pub(crate) fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
