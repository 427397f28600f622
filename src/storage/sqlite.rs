//! `SQLite` storage implementation.
//!
//! Provides persistent storage using `SQLite`: the text object store and
//! the variable job table share one database file.

// SQLite stores all integers as i64. These casts are intentional and safe
// because we only store non-negative values that fit in usize.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]

use crate::core::{JobProgress, JobStatus, QueueItem, QueueJob, QueueStats, current_timestamp};
use crate::error::{QueueError, Result, StorageError};
use crate::storage::schema::{
    CHECK_SCHEMA_SQL, CURRENT_SCHEMA_VERSION, GET_VERSION_SQL, SCHEMA_SQL, SET_VERSION_SQL,
};
use crate::storage::traits::{ObjectInfo, ObjectStore, StorageStats, validate_bucket_name};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::{Path, PathBuf};

/// Columns selected for job rows, in [`JobRow::from_row`] order.
const JOB_COLUMNS: &str =
    "id, hash, variable, status, progress, attempts, error, created_at, updated_at";

/// SQLite-based storage implementation.
///
/// # Examples
///
/// ```no_run
/// use varsep::storage::{ObjectStore, SqliteStorage};
///
/// let mut storage = SqliteStorage::open(".varsep/varsep.db").unwrap();
/// storage.init().unwrap();
/// storage.ensure_bucket("documents").unwrap();
/// storage.put_text_object("documents", "greeting", "Hello <VAR:0123456789ab>").unwrap();
/// ```
#[derive(Debug)]
pub struct SqliteStorage {
    /// `SQLite` connection.
    conn: Connection,
    /// Path to the database file (None for in-memory).
    path: Option<PathBuf>,
}

impl SqliteStorage {
    /// Opens or creates a `SQLite` database at the given path.
    ///
    /// Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Database(e.to_string()))?;
        }

        let conn = Connection::open(&path).map_err(StorageError::from)?;

        conn.execute("PRAGMA foreign_keys = ON;", [])
            .map_err(StorageError::from)?;

        // journal_mode returns the resulting mode as a row
        let _: String = conn
            .query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))
            .map_err(StorageError::from)?;

        Ok(Self {
            conn,
            path: Some(path),
        })
    }

    /// Creates an in-memory `SQLite` database.
    ///
    /// Useful for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        conn.execute("PRAGMA foreign_keys = ON;", [])
            .map_err(StorageError::from)?;

        Ok(Self { conn, path: None })
    }

    /// Returns the database path (None for in-memory).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Initializes the schema. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Migration`] if the database was written by a
    /// newer schema version, or a database error.
    pub fn init(&mut self) -> Result<()> {
        if self.is_initialized()? {
            let current = self.get_schema_version()?.unwrap_or(0);
            if current > CURRENT_SCHEMA_VERSION {
                return Err(StorageError::Migration(format!(
                    "database schema version {current} is newer than supported version {CURRENT_SCHEMA_VERSION}"
                ))
                .into());
            }
        }

        self.conn
            .execute_batch(SCHEMA_SQL)
            .map_err(StorageError::from)?;
        self.set_schema_version(CURRENT_SCHEMA_VERSION)?;
        Ok(())
    }

    /// Checks whether the schema has been created.
    ///
    /// # Errors
    ///
    /// Returns an error if the check fails.
    pub fn is_initialized(&self) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row(CHECK_SCHEMA_SQL, [], |row| row.get(0))
            .map_err(StorageError::from)?;
        Ok(count > 0)
    }

    /// Deletes all objects, buckets, and jobs. The schema is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    pub fn reset(&mut self) -> Result<()> {
        self.conn
            .execute_batch(
                r"
            DELETE FROM objects;
            DELETE FROM buckets;
            DELETE FROM jobs;
        ",
            )
            .map_err(StorageError::from)?;
        Ok(())
    }

    /// Gets the current schema version.
    fn get_schema_version(&self) -> Result<Option<u32>> {
        let version: Option<String> = self
            .conn
            .query_row(GET_VERSION_SQL, [], |row| row.get(0))
            .optional()
            .map_err(StorageError::from)?;

        Ok(version.and_then(|v| v.parse().ok()))
    }

    /// Sets the schema version.
    fn set_schema_version(&self, version: u32) -> Result<()> {
        self.conn
            .execute(SET_VERSION_SQL, params![version.to_string()])
            .map_err(StorageError::from)?;
        Ok(())
    }

    fn require_bucket(&self, bucket: &str) -> Result<()> {
        if self.bucket_exists(bucket)? {
            Ok(())
        } else {
            Err(StorageError::BucketNotFound {
                bucket: bucket.to_string(),
            }
            .into())
        }
    }
}

impl ObjectStore for SqliteStorage {
    fn ensure_bucket(&mut self, bucket: &str) -> Result<()> {
        validate_bucket_name(bucket)?;
        self.conn
            .execute(
                "INSERT OR IGNORE INTO buckets (name, created_at) VALUES (?, ?)",
                params![bucket, current_timestamp()],
            )
            .map_err(StorageError::from)?;
        Ok(())
    }

    fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM buckets WHERE name = ?",
                params![bucket],
                |row| row.get(0),
            )
            .map_err(StorageError::from)?;
        Ok(count > 0)
    }

    fn put_text_object(&mut self, bucket: &str, key: &str, contents: &str) -> Result<()> {
        self.require_bucket(bucket)?;
        let now = current_timestamp();

        self.conn
            .execute(
                r"
            INSERT INTO objects (bucket, key, contents, size, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (bucket, key) DO UPDATE SET
                contents = excluded.contents,
                size = excluded.size,
                updated_at = excluded.updated_at
        ",
                params![bucket, key, contents, contents.len() as i64, now, now],
            )
            .map_err(StorageError::from)?;

        Ok(())
    }

    fn get_text_object(&self, bucket: &str, key: &str) -> Result<String> {
        self.require_bucket(bucket)?;

        let contents: Option<String> = self
            .conn
            .query_row(
                "SELECT contents FROM objects WHERE bucket = ? AND key = ?",
                params![bucket, key],
                |row| row.get(0),
            )
            .optional()
            .map_err(StorageError::from)?;

        contents.ok_or_else(|| {
            StorageError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }
            .into()
        })
    }

    fn list_objects(&self, bucket: &str) -> Result<Vec<ObjectInfo>> {
        self.require_bucket(bucket)?;

        let mut stmt = self
            .conn
            .prepare("SELECT bucket, key, size, updated_at FROM objects WHERE bucket = ? ORDER BY key")
            .map_err(StorageError::from)?;

        let objects = stmt
            .query_map(params![bucket], |row| {
                Ok(ObjectInfo {
                    bucket: row.get(0)?,
                    key: row.get(1)?,
                    size: row.get::<_, i64>(2)? as usize,
                    updated_at: row.get(3)?,
                })
            })
            .map_err(StorageError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StorageError::from)?;

        Ok(objects)
    }

    fn delete_object(&mut self, bucket: &str, key: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute(
                "DELETE FROM objects WHERE bucket = ? AND key = ?",
                params![bucket, key],
            )
            .map_err(StorageError::from)?;
        Ok(rows > 0)
    }

    fn stats(&self) -> Result<StorageStats> {
        let bucket_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM buckets", [], |row| row.get(0))
            .map_err(StorageError::from)?;

        let (object_count, total_size): (i64, i64) = self
            .conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(size), 0) FROM objects",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(StorageError::from)?;

        let schema_version = self.get_schema_version()?.unwrap_or(0);

        let db_size = self
            .path
            .as_ref()
            .and_then(|p| std::fs::metadata(p).ok().map(|m| m.len()));

        Ok(StorageStats {
            bucket_count: bucket_count as usize,
            object_count: object_count as usize,
            total_object_size: total_size as usize,
            jobs: self.job_counts()?,
            schema_version,
            db_size,
        })
    }
}

// ==================== Job Operations ====================

/// Raw job row before status and progress are parsed.
struct JobRow {
    id: i64,
    hash: String,
    variable: String,
    status: String,
    progress: Option<String>,
    attempts: i64,
    error: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl JobRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            hash: row.get(1)?,
            variable: row.get(2)?,
            status: row.get(3)?,
            progress: row.get(4)?,
            attempts: row.get(5)?,
            error: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    fn into_job(self) -> Result<QueueJob> {
        let status: JobStatus = self.status.parse()?;
        let progress = self
            .progress
            .map(|p| serde_json::from_str::<JobProgress>(&p))
            .transpose()
            .map_err(StorageError::from)?;

        Ok(QueueJob {
            id: self.id,
            item: QueueItem::new(self.hash, self.variable),
            status,
            progress,
            attempts: self.attempts as u32,
            error: self.error,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl SqliteStorage {
    /// Inserts a pending job and returns its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_job(&mut self, item: &QueueItem) -> Result<i64> {
        let now = current_timestamp();
        self.conn
            .execute(
                "INSERT INTO jobs (hash, variable, status, created_at, updated_at) VALUES (?, ?, 'pending', ?, ?)",
                params![item.hash, item.variable, now, now],
            )
            .map_err(StorageError::from)?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Claims the oldest pending job, marking it running.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails.
    pub fn claim_next_job(&mut self) -> Result<Option<QueueJob>> {
        let tx = self.conn.transaction().map_err(StorageError::from)?;

        let row = tx
            .query_row(
                &format!(
                    "SELECT {JOB_COLUMNS} FROM jobs WHERE status = 'pending' ORDER BY id LIMIT 1"
                ),
                [],
                JobRow::from_row,
            )
            .optional()
            .map_err(StorageError::from)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let now = current_timestamp();
        tx.execute(
            "UPDATE jobs SET status = 'running', attempts = attempts + 1, updated_at = ? WHERE id = ?",
            params![now, row.id],
        )
        .map_err(StorageError::from)?;
        tx.commit().map_err(StorageError::from)?;

        let mut job = row.into_job()?;
        job.status = JobStatus::Running;
        job.attempts += 1;
        job.updated_at = now;
        Ok(Some(job))
    }

    /// Gets a job by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_job(&self, id: i64) -> Result<Option<QueueJob>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?"),
                params![id],
                JobRow::from_row,
            )
            .optional()
            .map_err(StorageError::from)?;

        row.map(JobRow::into_job).transpose()
    }

    /// Lists jobs in enqueue order, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_jobs(&self, status: Option<JobStatus>) -> Result<Vec<QueueJob>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {JOB_COLUMNS} FROM jobs WHERE (?1 IS NULL OR status = ?1) ORDER BY id"
            ))
            .map_err(StorageError::from)?;

        let rows = stmt
            .query_map(params![status.map(JobStatus::as_str)], JobRow::from_row)
            .map_err(StorageError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StorageError::from)?;

        rows.into_iter().map(JobRow::into_job).collect()
    }

    /// Records progress for a job.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::JobNotFound`] if the job does not exist.
    pub fn update_job_progress(&mut self, id: i64, progress: &JobProgress) -> Result<()> {
        let data = serde_json::to_string(progress).map_err(StorageError::from)?;
        let rows = self
            .conn
            .execute(
                "UPDATE jobs SET progress = ?, updated_at = ? WHERE id = ?",
                params![data, current_timestamp(), id],
            )
            .map_err(StorageError::from)?;
        Self::require_rows(rows, id)
    }

    /// Completes a job, removing it from the queue.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::JobNotFound`] if the job does not exist.
    pub fn complete_job(&mut self, id: i64) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM jobs WHERE id = ?", params![id])
            .map_err(StorageError::from)?;
        Self::require_rows(rows, id)
    }

    /// Marks a job failed with a reason.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::JobNotFound`] if the job does not exist.
    pub fn fail_job(&mut self, id: i64, reason: &str) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE jobs SET status = 'failed', error = ?, updated_at = ? WHERE id = ?",
                params![reason, current_timestamp(), id],
            )
            .map_err(StorageError::from)?;
        Self::require_rows(rows, id)
    }

    /// Moves failed jobs back to pending. Returns the number of jobs moved.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn retry_failed_jobs(&mut self) -> Result<usize> {
        let rows = self
            .conn
            .execute(
                "UPDATE jobs SET status = 'pending', error = NULL, progress = NULL, updated_at = ? WHERE status = 'failed'",
                params![current_timestamp()],
            )
            .map_err(StorageError::from)?;
        Ok(rows)
    }

    /// Moves running jobs that have not been updated for `idle_secs`
    /// seconds back to pending. Returns the number of jobs moved.
    ///
    /// A job stays running when its worker dies or its completion times out
    /// and is lost; this hands it to the next claim.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn requeue_stale_jobs(&mut self, idle_secs: i64) -> Result<usize> {
        let now = current_timestamp();
        let rows = self
            .conn
            .execute(
                "UPDATE jobs SET status = 'pending', progress = NULL, updated_at = ?1 WHERE status = 'running' AND updated_at <= ?2",
                params![now, now.saturating_sub(idle_secs)],
            )
            .map_err(StorageError::from)?;
        Ok(rows)
    }

    /// Counts jobs by status.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn job_counts(&self) -> Result<QueueStats> {
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM jobs GROUP BY status")
            .map_err(StorageError::from)?;

        let counts = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
            .map_err(StorageError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StorageError::from)?;

        let mut stats = QueueStats::default();
        for (status, count) in counts {
            let count = count as usize;
            match status.parse::<JobStatus>()? {
                JobStatus::Pending => stats.pending = count,
                JobStatus::Running => stats.running = count,
                JobStatus::Failed => stats.failed = count,
            }
        }
        Ok(stats)
    }

    fn require_rows(rows: usize, id: i64) -> Result<()> {
        if rows == 0 {
            Err(QueueError::JobNotFound { id }.into())
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn setup() -> SqliteStorage {
        let mut storage = SqliteStorage::in_memory().unwrap();
        storage.init().unwrap();
        storage
    }

    #[test]
    fn test_init() {
        let storage = setup();
        assert!(storage.is_initialized().unwrap());
        assert_eq!(
            storage.get_schema_version().unwrap(),
            Some(CURRENT_SCHEMA_VERSION)
        );
    }

    #[test]
    fn test_init_idempotent() {
        let mut storage = setup();
        storage.init().unwrap();
        assert!(storage.is_initialized().unwrap());
    }

    #[test]
    fn test_not_initialized() {
        let storage = SqliteStorage::in_memory().unwrap();
        assert!(!storage.is_initialized().unwrap());
    }

    #[test]
    fn test_newer_schema_rejected() {
        let mut storage = setup();
        storage.set_schema_version(CURRENT_SCHEMA_VERSION + 1).unwrap();
        let err = storage.init().unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::Migration(_))));
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("varsep.db");
        let mut storage = SqliteStorage::open(&path).unwrap();
        storage.init().unwrap();
        assert!(path.exists());
        assert_eq!(storage.path(), Some(path.as_path()));
    }

    #[test]
    fn test_ensure_bucket_idempotent() {
        let mut storage = setup();
        storage.ensure_bucket("documents").unwrap();
        storage.ensure_bucket("documents").unwrap();
        assert!(storage.bucket_exists("documents").unwrap());
        assert!(!storage.bucket_exists("other").unwrap());
        assert_eq!(storage.stats().unwrap().bucket_count, 1);
    }

    #[test]
    fn test_ensure_bucket_invalid_name() {
        let mut storage = setup();
        let err = storage.ensure_bucket("Bad Name").unwrap_err();
        assert!(matches!(
            err,
            Error::Storage(StorageError::InvalidBucketName { .. })
        ));
    }

    #[test]
    fn test_object_crud() {
        let mut storage = setup();
        storage.ensure_bucket("documents").unwrap();

        storage.put_text_object("documents", "a.txt", "first").unwrap();
        assert_eq!(storage.get_text_object("documents", "a.txt").unwrap(), "first");

        storage.put_text_object("documents", "a.txt", "second").unwrap();
        assert_eq!(storage.get_text_object("documents", "a.txt").unwrap(), "second");

        storage.put_text_object("documents", "b.txt", "héllo").unwrap();
        let objects = storage.list_objects("documents").unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].key, "a.txt");
        assert_eq!(objects[1].size, "héllo".len());

        assert!(storage.delete_object("documents", "a.txt").unwrap());
        assert!(!storage.delete_object("documents", "a.txt").unwrap());
        assert_eq!(storage.list_objects("documents").unwrap().len(), 1);
    }

    #[test]
    fn test_missing_bucket() {
        let mut storage = setup();
        let err = storage.put_text_object("missing", "k", "v").unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::BucketNotFound { .. })));

        let err = storage.get_text_object("missing", "k").unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::BucketNotFound { .. })));
    }

    #[test]
    fn test_missing_object() {
        let mut storage = setup();
        storage.ensure_bucket("documents").unwrap();
        let err = storage.get_text_object("documents", "nope").unwrap_err();
        assert_eq!(err.to_string(), "storage error: object not found: documents/nope");
    }

    #[test]
    fn test_job_lifecycle() {
        let mut storage = setup();
        let first = storage.insert_job(&QueueItem::new("aaa", "{{a}}")).unwrap();
        let second = storage.insert_job(&QueueItem::new("bbb", "{{b}}")).unwrap();
        assert!(first < second);

        let job = storage.claim_next_job().unwrap().unwrap();
        assert_eq!(job.id, first);
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.attempts, 1);

        storage
            .update_job_progress(job.id, &JobProgress::Percent(50))
            .unwrap();
        let stored = storage.get_job(job.id).unwrap().unwrap();
        assert_eq!(stored.progress, Some(JobProgress::Percent(50)));
        assert_eq!(stored.status, JobStatus::Running);

        storage.complete_job(job.id).unwrap();
        assert!(storage.get_job(job.id).unwrap().is_none());

        let next = storage.claim_next_job().unwrap().unwrap();
        assert_eq!(next.id, second);
        assert!(storage.claim_next_job().unwrap().is_none());
    }

    #[test]
    fn test_fail_and_retry() {
        let mut storage = setup();
        storage.insert_job(&QueueItem::new("aaa", "{{a}}")).unwrap();
        let job = storage.claim_next_job().unwrap().unwrap();
        storage.fail_job(job.id, "boom").unwrap();

        let failed = storage.list_jobs(Some(JobStatus::Failed)).unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].error.as_deref(), Some("boom"));

        assert_eq!(storage.retry_failed_jobs().unwrap(), 1);
        let job = storage.claim_next_job().unwrap().unwrap();
        assert_eq!(job.attempts, 2);
        assert!(job.error.is_none());
    }

    #[test]
    fn test_requeue_stale_running_job() {
        let mut storage = setup();
        storage.insert_job(&QueueItem::new("aaa", "{{a}}")).unwrap();
        let job = storage.claim_next_job().unwrap().unwrap();
        storage
            .update_job_progress(job.id, &JobProgress::Percent(0))
            .unwrap();

        // Recently touched jobs stay with their worker.
        assert_eq!(storage.requeue_stale_jobs(3600).unwrap(), 0);
        assert!(storage.claim_next_job().unwrap().is_none());

        assert_eq!(storage.requeue_stale_jobs(0).unwrap(), 1);
        let stats = storage.job_counts().unwrap();
        assert_eq!((stats.pending, stats.running), (1, 0));

        let reclaimed = storage.claim_next_job().unwrap().unwrap();
        assert_eq!(reclaimed.id, job.id);
        assert_eq!(reclaimed.attempts, 2);
        assert!(reclaimed.progress.is_none());
    }

    #[test]
    fn test_requeue_stale_ignores_failed_and_pending() {
        let mut storage = setup();
        storage.insert_job(&QueueItem::new("aaa", "{{a}}")).unwrap();
        storage.insert_job(&QueueItem::new("bbb", "{{b}}")).unwrap();
        let job = storage.claim_next_job().unwrap().unwrap();
        storage.fail_job(job.id, "boom").unwrap();

        assert_eq!(storage.requeue_stale_jobs(0).unwrap(), 0);
        let stats = storage.job_counts().unwrap();
        assert_eq!((stats.pending, stats.failed), (1, 1));
    }

    #[test]
    fn test_unknown_job() {
        let mut storage = setup();
        let err = storage.complete_job(42).unwrap_err();
        assert!(matches!(err, Error::Queue(QueueError::JobNotFound { id: 42 })));
        assert!(storage.fail_job(42, "x").is_err());
        assert!(storage
            .update_job_progress(42, &JobProgress::Percent(1))
            .is_err());
    }

    #[test]
    fn test_list_jobs_filter() {
        let mut storage = setup();
        storage.insert_job(&QueueItem::new("aaa", "{{a}}")).unwrap();
        storage.insert_job(&QueueItem::new("bbb", "{{b}}")).unwrap();
        storage.claim_next_job().unwrap();

        assert_eq!(storage.list_jobs(None).unwrap().len(), 2);
        assert_eq!(storage.list_jobs(Some(JobStatus::Pending)).unwrap().len(), 1);
        assert_eq!(storage.list_jobs(Some(JobStatus::Running)).unwrap().len(), 1);
    }

    #[test]
    fn test_reset() {
        let mut storage = setup();
        storage.ensure_bucket("documents").unwrap();
        storage.put_text_object("documents", "k", "v").unwrap();
        storage.insert_job(&QueueItem::new("aaa", "{{a}}")).unwrap();

        storage.reset().unwrap();

        let stats = storage.stats().unwrap();
        assert_eq!(stats.bucket_count, 0);
        assert_eq!(stats.object_count, 0);
        assert_eq!(stats.jobs.total(), 0);
        assert!(storage.is_initialized().unwrap());
    }

    #[test]
    fn test_stats() {
        let mut storage = setup();
        storage.ensure_bucket("documents").unwrap();
        storage.put_text_object("documents", "a", "12345").unwrap();
        storage.put_text_object("documents", "b", "678").unwrap();
        storage.insert_job(&QueueItem::new("aaa", "{{a}}")).unwrap();
        storage.insert_job(&QueueItem::new("bbb", "{{b}}")).unwrap();
        let job = storage.claim_next_job().unwrap().unwrap();
        storage.fail_job(job.id, "x").unwrap();

        let stats = storage.stats().unwrap();
        assert_eq!(stats.object_count, 2);
        assert_eq!(stats.total_object_size, 8);
        assert_eq!(stats.jobs.pending, 1);
        assert_eq!(stats.jobs.failed, 1);
        assert_eq!(stats.jobs.running, 0);
        assert_eq!(stats.schema_version, CURRENT_SCHEMA_VERSION);
        assert!(stats.db_size.is_none());
    }
}
