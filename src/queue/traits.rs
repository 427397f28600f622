//! Queue boundary traits.
//!
//! The separator core only ever enqueues; progress reporting is a
//! capability of the claimed job handed to a worker.

use crate::core::JobProgress;
use crate::error::Result;
use async_trait::async_trait;

/// A queue accepting variable jobs.
///
/// Delivery is at-least-once. Implementations do not retry; failures are
/// reported as [`crate::error::QueueError::EnqueueFailure`] or
/// [`crate::error::QueueError::Timeout`].
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueues a variable under its hash.
    async fn add_to_queue(&self, hash: &str, variable: &str) -> Result<()>;
}

/// Progress reporting for a running job.
#[async_trait]
pub trait ProgressUpdate: Send + Sync {
    /// Records the job's current progress.
    async fn update_progress(&self, progress: JobProgress) -> Result<()>;
}
