//! Job queue backed by the shared `SQLite` database.
//!
//! Every operation runs on a blocking thread and is bounded by the queue
//! timeout.

use crate::core::{JobProgress, JobStatus, QueueItem, QueueJob, QueueStats};
use crate::error::{Error, QueueError, Result, StorageError};
use crate::queue::traits::{JobQueue, ProgressUpdate};
use crate::storage::SqliteStorage;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Storage handle shared between the queue, the worker and the pipeline.
pub type SharedStorage = Arc<Mutex<SqliteStorage>>;

/// Default timeout for a single queue operation.
pub const DEFAULT_QUEUE_TIMEOUT: Duration = Duration::from_secs(5);

/// `SQLite` job queue.
///
/// # Examples
///
/// ```no_run
/// use std::sync::{Arc, Mutex};
/// use varsep::queue::{JobQueue, SqliteQueue};
/// use varsep::storage::SqliteStorage;
///
/// # async fn demo() -> varsep::Result<()> {
/// let mut storage = SqliteStorage::in_memory()?;
/// storage.init()?;
/// let queue = SqliteQueue::new(Arc::new(Mutex::new(storage)));
/// queue.add_to_queue("9f86d081884c", "{{name}}").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SqliteQueue {
    storage: SharedStorage,
    timeout: Duration,
}

impl SqliteQueue {
    /// Creates a queue on the shared storage with the default timeout.
    #[must_use]
    pub fn new(storage: SharedStorage) -> Self {
        Self {
            storage,
            timeout: DEFAULT_QUEUE_TIMEOUT,
        }
    }

    /// Sets the per-operation timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the per-operation timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the shared storage handle.
    #[must_use]
    pub const fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    /// Runs `op` against the storage on a blocking thread.
    ///
    /// When the timeout elapses the operation is detached, not aborted, and
    /// may still complete.
    pub(crate) async fn with_storage<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteStorage) -> Result<T> + Send + 'static,
    {
        let storage = Arc::clone(&self.storage);
        let task = tokio::task::spawn_blocking(move || {
            let mut guard = storage
                .lock()
                .map_err(|_| StorageError::Database("storage lock poisoned".to_string()))?;
            op(&mut guard)
        });

        match tokio::time::timeout(self.timeout, task).await {
            Ok(joined) => joined.map_err(QueueError::from)?,
            Err(_) => Err(QueueError::Timeout {
                millis: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }
            .into()),
        }
    }

    /// Claims the oldest pending job.
    ///
    /// # Errors
    ///
    /// Returns an error if the claim fails or times out.
    pub async fn claim_next(&self) -> Result<Option<ClaimedJob>> {
        let job = self.with_storage(SqliteStorage::claim_next_job).await?;
        Ok(job.map(|job| ClaimedJob {
            job,
            queue: self.clone(),
        }))
    }

    /// Lists jobs, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or times out.
    pub async fn list_jobs(&self, status: Option<JobStatus>) -> Result<Vec<QueueJob>> {
        self.with_storage(move |s| s.list_jobs(status)).await
    }

    /// Counts jobs by status.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or times out.
    pub async fn stats(&self) -> Result<QueueStats> {
        self.with_storage(|s| s.job_counts()).await
    }

    /// Moves failed jobs back to pending. Returns the number moved.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails or times out.
    pub async fn retry_failed(&self) -> Result<usize> {
        self.with_storage(SqliteStorage::retry_failed_jobs).await
    }

    /// Moves running jobs idle for at least `idle` back to pending. Returns
    /// the number moved.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails or times out.
    pub async fn requeue_stale(&self, idle: Duration) -> Result<usize> {
        let idle_secs = i64::try_from(idle.as_secs()).unwrap_or(i64::MAX);
        self.with_storage(move |s| s.requeue_stale_jobs(idle_secs))
            .await
    }
}

#[async_trait]
impl JobQueue for SqliteQueue {
    async fn add_to_queue(&self, hash: &str, variable: &str) -> Result<()> {
        let item = QueueItem::new(hash, variable);
        let id = self
            .with_storage(move |s| s.insert_job(&item))
            .await
            .map_err(|e| match e {
                Error::Queue(q) => Error::Queue(q),
                other => QueueError::EnqueueFailure(other.to_string()).into(),
            })?;
        tracing::debug!(id, hash, "enqueued variable");
        Ok(())
    }
}

/// A job claimed by a worker.
///
/// Dropping a claimed job without completing or failing it leaves it in the
/// running state until [`SqliteQueue::requeue_stale`] hands it back.
#[derive(Debug)]
pub struct ClaimedJob {
    job: QueueJob,
    queue: SqliteQueue,
}

impl ClaimedJob {
    /// Returns the job ID.
    #[must_use]
    pub const fn id(&self) -> i64 {
        self.job.id
    }

    /// Returns the job payload.
    #[must_use]
    pub const fn item(&self) -> &QueueItem {
        &self.job.item
    }

    /// Returns the job as it was when claimed.
    #[must_use]
    pub const fn job(&self) -> &QueueJob {
        &self.job
    }

    /// Completes the job, removing it from the queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the job no longer exists or the update times out.
    pub async fn complete(self) -> Result<()> {
        let id = self.job.id;
        self.queue.with_storage(move |s| s.complete_job(id)).await
    }

    /// Marks the job failed.
    ///
    /// # Errors
    ///
    /// Returns an error if the job no longer exists or the update times out.
    pub async fn fail(self, reason: &str) -> Result<()> {
        let id = self.job.id;
        let reason = reason.to_string();
        self.queue
            .with_storage(move |s| s.fail_job(id, &reason))
            .await
    }
}

#[async_trait]
impl ProgressUpdate for ClaimedJob {
    async fn update_progress(&self, progress: JobProgress) -> Result<()> {
        if let JobProgress::Percent(pct) = progress {
            JobProgress::percent(pct)?;
        }
        let id = self.job.id;
        self.queue
            .with_storage(move |s| s.update_job_progress(id, &progress))
            .await
    }
}
