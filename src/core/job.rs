//! Queue job models.
//!
//! A [`QueueItem`] is the payload handed to the asynchronous pipeline for a
//! single variable. [`QueueJob`] is the stored row wrapping it, with status
//! and progress tracking.

use crate::core::Variable;
use crate::error::QueueError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Payload of a queued variable job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    /// Content hash of the variable.
    pub hash: String,
    /// Original variable span.
    pub variable: String,
}

impl QueueItem {
    /// Creates a new queue item.
    #[must_use]
    pub fn new(hash: impl Into<String>, variable: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            variable: variable.into(),
        }
    }
}

impl From<&Variable> for QueueItem {
    fn from(var: &Variable) -> Self {
        Self::new(var.hash.clone(), var.value.clone())
    }
}

/// Progress reported by a running job.
///
/// Either a plain percentage or an arbitrary structured value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum JobProgress {
    /// Completion percentage, 0 to 100.
    Percent(u8),
    /// Caller-defined progress payload.
    Structured(serde_json::Value),
}

impl JobProgress {
    /// Creates a percentage progress value.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::InvalidProgress`] if `pct` exceeds 100.
    pub fn percent(pct: u8) -> Result<Self, QueueError> {
        if pct > 100 {
            return Err(QueueError::InvalidProgress(format!(
                "percentage {pct} exceeds 100"
            )));
        }
        Ok(Self::Percent(pct))
    }
}

impl fmt::Display for JobProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percent(p) => write!(f, "{p}%"),
            Self::Structured(v) => write!(f, "{v}"),
        }
    }
}

/// Lifecycle state of a queued job.
///
/// Completed jobs are removed from the queue, so there is no completed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Waiting to be claimed.
    Pending,
    /// Claimed by a worker.
    Running,
    /// Finished with an error.
    Failed,
}

impl JobStatus {
    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = QueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "failed" => Ok(Self::Failed),
            other => Err(QueueError::InvalidStatus(other.to_string())),
        }
    }
}

/// A stored queue job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueJob {
    /// Job ID assigned by the queue.
    pub id: i64,
    /// Job payload.
    pub item: QueueItem,
    /// Current status.
    pub status: JobStatus,
    /// Last reported progress.
    pub progress: Option<JobProgress>,
    /// Number of times the job was claimed.
    pub attempts: u32,
    /// Failure reason for failed jobs.
    pub error: Option<String>,
    /// Unix timestamp of enqueue.
    pub created_at: i64,
    /// Unix timestamp of the last status change.
    pub updated_at: i64,
}

/// Job counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Jobs waiting to be claimed.
    pub pending: usize,
    /// Jobs currently claimed by a worker.
    pub running: usize,
    /// Jobs that failed.
    pub failed: usize,
}

impl QueueStats {
    /// Total number of jobs still in the queue.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.pending + self.running + self.failed
    }
}
