//! # varsep
//!
//! Reversible masking of template variables for translation pipelines.
//!
//! Variables such as `{{name}}` or `%1$s` are replaced by placeholder tokens
//! encoding a content hash of the span, so machine translation cannot
//! mangle them, and restored afterwards.
//!
//! ## Features
//!
//! - **Separation**: pluggable extractors (pattern presets or custom regex)
//!   and hashers; exact round-trip for every input
//! - **Job Queue**: async `add_to_queue` boundary with a `SQLite` queue,
//!   progress reporting and a worker
//! - **Object Storage**: bucket/key text objects with variable manifests
//! - **Memory Mapping**: efficient reading of large documents
//!
//! ## Example
//!
//! ```
//! use varsep::VariableSeparator;
//!
//! let separator = VariableSeparator::builder().build().unwrap();
//! let result = separator.separate_variables("Hi {{name}}!").unwrap();
//! let back = separator
//!     .restore_variables(&result.processed_text, &result.variables)
//!     .unwrap();
//! assert_eq!(back, "Hi {{name}}!");
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
// Note: unsafe is needed for memory-mapped I/O (memmap2)
#![warn(unsafe_code)]

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod queue;
pub mod separation;
pub mod storage;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

// Re-export core domain types
pub use crate::core::{
    JobProgress, JobStatus, QueueItem, QueueJob, QueueStats, SeparationResult, Span, Variable,
};

// Re-export separation types
pub use separation::{
    RegexExtractor, Sha256Hasher, SpanHasher, UnmatchedPolicy, VariableExtractor,
    VariableSeparator, available_patterns, create_extractor,
};

// Re-export queue types
pub use queue::{JobQueue, ProgressUpdate, SqliteQueue, Worker, enqueue_variables};

// Re-export storage types
pub use storage::{DEFAULT_DB_PATH, ObjectStore, SqliteStorage};

// Re-export pipeline and config
pub use config::SeparatorConfig;
pub use pipeline::{VariableManifest, mask_document, unmask_document};

// Re-export CLI types
pub use cli::{Cli, Commands, OutputFormat};
