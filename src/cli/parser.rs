//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// varsep: mask template variables before translation and restore them
/// afterwards.
///
/// Variables such as `{{name}}` are replaced by hash placeholders like
/// `<VAR:9f86d081884c>` that translation tools leave untouched.
#[derive(Parser, Debug)]
#[command(name = "varsep")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the varsep database file.
    ///
    /// Defaults to `.varsep/varsep.db` in the current directory.
    #[arg(short, long, env = "VARSEP_DB_PATH", global = true)]
    pub db_path: Option<PathBuf>,

    /// Configuration file (defaults to the nearest `.varseprc.json`).
    #[arg(short, long, env = "VARSEP_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Variable pattern preset (see `varsep patterns`).
    #[arg(short, long, env = "VARSEP_PATTERN", global = true)]
    pub pattern: Option<String>,

    /// Custom variable regex (overrides --pattern).
    #[arg(long, global = true)]
    pub regex: Option<String>,

    /// Hash width in hex digits (8-64).
    #[arg(long, global = true)]
    pub hash_len: Option<usize>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the varsep database.
    ///
    /// Creates the database file and schema if they don't exist.
    Init {
        /// Force re-initialization (destroys existing data).
        #[arg(short, long)]
        force: bool,
    },

    /// Show stored objects and queue state.
    Status,

    /// Reset varsep state (delete all objects and jobs).
    Reset {
        /// Skip confirmation prompt.
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Mask the variables of a text.
    Separate {
        /// Input file (reads stdin if omitted or `-`).
        file: Option<PathBuf>,

        /// Write the masked text to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the extracted variables to a JSON file.
        #[arg(long)]
        variables: Option<PathBuf>,
    },

    /// Restore the variables of a masked text.
    Restore {
        /// Masked input file (reads stdin if omitted or `-`).
        file: Option<PathBuf>,

        /// JSON file with the variables (from `separate --variables`).
        #[arg(long)]
        variables: PathBuf,

        /// Leave placeholders with unknown hashes in place.
        #[arg(short, long)]
        keep_unmatched: bool,

        /// Write the restored text to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Mask a document into object storage and enqueue its variables.
    Mask {
        /// Document to mask.
        file: PathBuf,

        /// Target bucket.
        #[arg(short, long)]
        bucket: String,

        /// Object key (defaults to the file name).
        #[arg(short, long)]
        key: Option<String>,

        /// Do not enqueue the extracted variables.
        #[arg(long)]
        no_enqueue: bool,
    },

    /// Restore a masked document from object storage.
    Unmask {
        /// Bucket holding the document.
        #[arg(short, long)]
        bucket: String,

        /// Key of the masked document (its manifest is used).
        #[arg(short, long)]
        key: String,

        /// Read the text from this key instead (e.g. a translated copy).
        #[arg(short, long)]
        from_key: Option<String>,

        /// Write the restored text to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Variable job queue.
    #[command(subcommand)]
    Queue(QueueCommands),

    /// List variable pattern presets.
    Patterns,

    /// Print the hash and placeholder for a variable.
    Hash {
        /// Variable text, e.g. `{{name}}`.
        text: String,
    },

    /// Show the effective configuration.
    Config {
        /// Print the default configuration instead.
        #[arg(long)]
        default: bool,
    },
}

/// Queue subcommands.
#[derive(Subcommand, Debug)]
pub enum QueueCommands {
    /// List queued jobs.
    #[command(alias = "ls")]
    List {
        /// Only jobs with this status (pending, running, failed).
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Process queued jobs.
    Work {
        /// Maximum number of jobs to process.
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Move failed jobs, and running jobs that stopped reporting, back to
    /// pending.
    Retry {
        /// Requeue running jobs idle for at least this many seconds
        /// (defaults to `staleJobSecs`, 600).
        #[arg(long, value_name = "SECS")]
        stale_after: Option<u64>,
    },
}

impl Cli {
    /// Returns the database path, using the default if not specified.
    #[must_use]
    pub fn get_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(crate::storage::DEFAULT_DB_PATH))
    }
}
