//! Queue worker.
//!
//! Drains variable jobs, registering each variable in the variables bucket
//! under its hash.

use crate::core::JobProgress;
use crate::error::{Error, QueueError, Result};
use crate::queue::sqlite::{ClaimedJob, SqliteQueue};
use crate::queue::traits::ProgressUpdate;
use crate::storage::{DEFAULT_VARIABLES_BUCKET, ObjectStore};
use serde::Serialize;
use std::time::Duration;

/// Default idle time after which a running job is considered abandoned.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(600);

/// Outcome of a worker run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkerReport {
    /// Jobs completed.
    pub processed: usize,
    /// Jobs marked failed.
    pub failed: usize,
    /// Abandoned running jobs moved back to pending before the run.
    pub requeued: usize,
}

/// Processes queued variable jobs.
#[derive(Debug, Clone)]
pub struct Worker {
    queue: SqliteQueue,
    bucket: String,
    stale_after: Option<Duration>,
}

impl Worker {
    /// Creates a worker storing variables in the default bucket.
    #[must_use]
    pub fn new(queue: SqliteQueue) -> Self {
        Self {
            queue,
            bucket: DEFAULT_VARIABLES_BUCKET.to_string(),
            stale_after: Some(DEFAULT_STALE_AFTER),
        }
    }

    /// Sets the bucket variables are stored in.
    #[must_use]
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    /// Sets how long a running job may go without updates before the next
    /// run requeues it. `None` disables requeueing.
    #[must_use]
    pub const fn with_stale_after(mut self, stale_after: Option<Duration>) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// Returns the target bucket.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Claims and processes jobs until the queue is empty or `limit` jobs
    /// have been handled.
    ///
    /// Running jobs idle longer than the stale threshold are first moved
    /// back to pending. A job that fails is marked failed and the worker
    /// moves on.
    ///
    /// # Errors
    ///
    /// Returns an error only when the queue itself fails (claim, complete
    /// or fail bookkeeping).
    pub async fn run(&self, limit: Option<usize>) -> Result<WorkerReport> {
        let mut report = WorkerReport::default();

        if let Some(idle) = self.stale_after {
            report.requeued = self.queue.requeue_stale(idle).await?;
            if report.requeued > 0 {
                tracing::warn!(requeued = report.requeued, "requeued stale running jobs");
            }
        }

        while limit.is_none_or(|max| report.processed + report.failed < max) {
            let Some(job) = self.queue.claim_next().await? else {
                break;
            };
            let id = job.id();

            match self.process(&job).await {
                Ok(()) => {
                    match job.complete().await {
                        Ok(()) => tracing::info!(id, "job completed"),
                        // Requeued and finished elsewhere; the variable is stored.
                        Err(Error::Queue(QueueError::JobNotFound { .. })) => {
                            tracing::warn!(id, "job already completed elsewhere");
                        }
                        Err(e) => return Err(e),
                    }
                    report.processed += 1;
                }
                Err(e) => {
                    tracing::error!(id, error = %e, "job failed");
                    job.fail(&e.to_string()).await?;
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    async fn process(&self, job: &ClaimedJob) -> Result<()> {
        job.update_progress(JobProgress::Percent(0)).await?;

        let bucket = self.bucket.clone();
        let item = job.item().clone();
        self.queue
            .with_storage(move |s| {
                s.ensure_bucket(&bucket)?;
                s.put_text_object(&bucket, &item.hash, &item.variable)
            })
            .await?;

        job.update_progress(JobProgress::Percent(100)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStorage;
    use crate::queue::JobQueue;
    use std::sync::{Arc, Mutex};

    fn setup() -> SqliteQueue {
        let mut storage = SqliteStorage::in_memory().unwrap();
        storage.init().unwrap();
        SqliteQueue::new(Arc::new(Mutex::new(storage)))
    }

    #[tokio::test]
    async fn test_worker_stores_variables() {
        let queue = setup();
        queue.add_to_queue("aaa", "{{a}}").await.unwrap();
        queue.add_to_queue("bbb", "{{b}}").await.unwrap();

        let report = Worker::new(queue.clone()).run(None).await.unwrap();
        assert_eq!(report, WorkerReport { processed: 2, failed: 0, requeued: 0 });

        let storage = queue.storage().lock().unwrap();
        assert_eq!(storage.get_text_object("variables", "aaa").unwrap(), "{{a}}");
        assert_eq!(storage.get_text_object("variables", "bbb").unwrap(), "{{b}}");
        assert_eq!(storage.job_counts().unwrap().total(), 0);
    }

    #[tokio::test]
    async fn test_worker_limit() {
        let queue = setup();
        for i in 0..3 {
            queue
                .add_to_queue(&format!("h{i}"), &format!("{{{{v{i}}}}}"))
                .await
                .unwrap();
        }

        let report = Worker::new(queue.clone()).run(Some(2)).await.unwrap();
        assert_eq!(report.processed, 2);
        assert_eq!(queue.stats().await.unwrap().pending, 1);
    }

    #[tokio::test]
    async fn test_worker_marks_failures_and_continues() {
        let queue = setup();
        queue.add_to_queue("aaa", "{{a}}").await.unwrap();

        let report = Worker::new(queue.clone())
            .with_bucket("Invalid_Bucket")
            .run(None)
            .await
            .unwrap();
        assert_eq!(report, WorkerReport { processed: 0, failed: 1, requeued: 0 });

        let failed = queue
            .list_jobs(Some(crate::core::JobStatus::Failed))
            .await
            .unwrap();
        assert_eq!(failed.len(), 1);
        assert!(failed[0].error.as_deref().unwrap().contains("invalid bucket name"));
        assert_eq!(failed[0].progress, Some(JobProgress::Percent(0)));
    }

    #[tokio::test]
    async fn test_worker_reclaims_abandoned_job() {
        let queue = setup();
        queue.add_to_queue("aaa", "{{a}}").await.unwrap();
        drop(queue.claim_next().await.unwrap().unwrap());

        // Within the default threshold the job still belongs to its worker.
        let report = Worker::new(queue.clone()).run(None).await.unwrap();
        assert_eq!(report, WorkerReport::default());
        assert_eq!(queue.stats().await.unwrap().running, 1);

        let report = Worker::new(queue.clone())
            .with_stale_after(Some(Duration::ZERO))
            .run(None)
            .await
            .unwrap();
        assert_eq!(report, WorkerReport { processed: 1, failed: 0, requeued: 1 });
        assert_eq!(queue.stats().await.unwrap().total(), 0);

        let storage = queue.storage().lock().unwrap();
        assert_eq!(storage.get_text_object("variables", "aaa").unwrap(), "{{a}}");
    }

    #[tokio::test]
    async fn test_completing_removed_job_is_not_found() {
        let queue = setup();
        queue.add_to_queue("aaa", "{{a}}").await.unwrap();
        let job = queue.claim_next().await.unwrap().unwrap();
        let id = job.id();
        queue
            .with_storage(move |s| s.complete_job(id))
            .await
            .unwrap();

        let err = job.complete().await.unwrap_err();
        assert!(matches!(err, Error::Queue(QueueError::JobNotFound { .. })));
    }

    #[tokio::test]
    async fn test_worker_empty_queue() {
        let report = Worker::new(setup()).run(None).await.unwrap();
        assert_eq!(report, WorkerReport::default());
    }
}
