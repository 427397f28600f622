//! Storage layer for varsep.
//!
//! Provides the text object store and the job table on a single `SQLite`
//! database. The pipeline depends only on the [`ObjectStore`] trait.

pub mod schema;
pub mod sqlite;
pub mod traits;

pub use schema::CURRENT_SCHEMA_VERSION;
pub use sqlite::SqliteStorage;
pub use traits::{ObjectInfo, ObjectStore, StorageStats, validate_bucket_name};

/// Default database path relative to project root.
pub const DEFAULT_DB_PATH: &str = ".varsep/varsep.db";

/// Default bucket the worker registers variables in.
pub const DEFAULT_VARIABLES_BUCKET: &str = "variables";
