//! Asynchronous job queue for extracted variables.
//!
//! [`JobQueue::add_to_queue`] is the only asynchronous operation the
//! separator pipeline depends on. [`SqliteQueue`] implements it on the
//! shared database and hands out [`ClaimedJob`]s that report progress.

pub mod sqlite;
pub mod traits;
pub mod worker;

pub use sqlite::{ClaimedJob, DEFAULT_QUEUE_TIMEOUT, SharedStorage, SqliteQueue};
pub use traits::{JobQueue, ProgressUpdate};
pub use worker::{DEFAULT_STALE_AFTER, Worker, WorkerReport};

use crate::core::SeparationResult;
use crate::error::Result;

/// Enqueues each distinct variable of a separation result once, in
/// encounter order. Returns the number of jobs enqueued.
///
/// Stops at the first failed enqueue; jobs already enqueued stay queued.
///
/// # Errors
///
/// Propagates the queue's enqueue error.
pub async fn enqueue_variables<Q>(queue: &Q, result: &SeparationResult) -> Result<usize>
where
    Q: JobQueue + ?Sized,
{
    let mut count = 0;
    for var in result.distinct_variables() {
        queue.add_to_queue(&var.hash, &var.value).await?;
        count += 1;
    }
    tracing::info!(count, "enqueued variables");
    Ok(count)
}
