//! Error types for varsep operations.
//!
//! This module provides the error hierarchy using `thiserror` for
//! separation, restoration, queue, storage, I/O, and CLI operations.

use thiserror::Error;

/// Result type alias for varsep operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Separation errors (pattern matching, hashing).
    #[error("separation error: {0}")]
    Separation(#[from] SeparationError),

    /// Restoration errors (placeholder resolution).
    #[error("restore error: {0}")]
    Restore(#[from] RestoreError),

    /// Queue errors (enqueue, job lifecycle).
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    /// Storage-related errors (database and object operations).
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O errors (file operations).
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// CLI command errors.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// Configuration errors.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

/// Errors raised while masking variables.
#[derive(Error, Debug)]
pub enum SeparationError {
    /// Two distinct spans produced the same hash within one call.
    #[error("hash collision on {hash}: {first:?} and {second:?}")]
    HashCollision {
        /// The colliding hash.
        hash: String,
        /// Span that claimed the hash first.
        first: String,
        /// Span that collided with it.
        second: String,
    },

    /// Variable pattern failed to compile.
    #[error("invalid variable pattern: {0}")]
    InvalidPattern(String),

    /// Unknown pattern preset name.
    #[error("unknown variable pattern: {name}")]
    UnknownPattern {
        /// Name that was requested.
        name: String,
    },

    /// Placeholder prefix/suffix cannot be parsed back unambiguously.
    #[error("invalid placeholder format: {0}")]
    InvalidPlaceholder(String),

    /// Hash length outside the supported range.
    #[error("hash length {len} outside supported range {min}..={max}")]
    InvalidHashLength {
        /// Requested length.
        len: usize,
        /// Minimum supported length.
        min: usize,
        /// Maximum supported length.
        max: usize,
    },
}

/// Errors raised while restoring variables.
#[derive(Error, Debug)]
pub enum RestoreError {
    /// Placeholder with no matching variable.
    #[error("unmatched placeholder: {hash}")]
    UnmatchedPlaceholder {
        /// Hash encoded in the placeholder.
        hash: String,
    },

    /// The same hash is mapped to two different values.
    #[error("conflicting values for hash {hash}")]
    ConflictingVariable {
        /// The conflicting hash.
        hash: String,
    },

    /// A variable's hash does not fit the placeholder format.
    #[error("variable hash {hash:?} is not {expected} lowercase hex digits")]
    MalformedHash {
        /// The rejected hash.
        hash: String,
        /// Hash width of the placeholder format.
        expected: usize,
    },
}

/// Queue-specific errors.
#[derive(Error, Debug)]
pub enum QueueError {
    /// The queue client rejected or failed the enqueue.
    #[error("enqueue failed: {0}")]
    EnqueueFailure(String),

    /// The queue client did not acknowledge in time.
    #[error("queue operation timed out after {millis}ms")]
    Timeout {
        /// Elapsed budget in milliseconds.
        millis: u64,
    },

    /// Job not found by ID.
    #[error("job not found: {id}")]
    JobNotFound {
        /// Job ID that was not found.
        id: i64,
    },

    /// Progress value out of range.
    #[error("invalid progress: {0}")]
    InvalidProgress(String),

    /// Unknown job status name.
    #[error("unknown job status: {0}")]
    InvalidStatus(String),
}

/// Storage-specific errors for database and object operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database connection or query error.
    #[error("database error: {0}")]
    Database(String),

    /// Storage not initialized (init command not run).
    #[error("varsep not initialized. Run: varsep init")]
    NotInitialized,

    /// Bucket does not exist.
    #[error("bucket not found: {bucket}")]
    BucketNotFound {
        /// Bucket name.
        bucket: String,
    },

    /// Object does not exist in the bucket.
    #[error("object not found: {bucket}/{key}")]
    ObjectNotFound {
        /// Bucket name.
        bucket: String,
        /// Object key.
        key: String,
    },

    /// Bucket name violates naming rules.
    #[error("invalid bucket name: {bucket}")]
    InvalidBucketName {
        /// Rejected bucket name.
        bucket: String,
    },

    /// Schema migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// I/O-specific errors for file operations.
#[derive(Error, Debug)]
pub enum IoError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path to the file that was not found.
        path: String,
    },

    /// Failed to read file.
    #[error("failed to read file: {path}: {reason}")]
    ReadFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to write file.
    #[error("failed to write file: {path}: {reason}")]
    WriteFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Memory mapping error.
    #[error("memory mapping failed: {path}: {reason}")]
    MmapFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Generic I/O error wrapper.
    #[error("I/O error: {0}")]
    Generic(String),
}

/// CLI command-specific errors.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Invalid argument provided.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Missing required argument.
    #[error("missing required argument: {0}")]
    MissingArgument(String),

    /// Command execution failed.
    #[error("command execution failed: {0}")]
    ExecutionFailed(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(IoError::Generic(err.to_string()))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(StorageError::Database(err.to_string()))
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<regex::Error> for SeparationError {
    fn from(err: regex::Error) -> Self {
        Self::InvalidPattern(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<tokio::task::JoinError> for QueueError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::EnqueueFailure(err.to_string())
    }
}
