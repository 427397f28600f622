//! CLI layer for varsep.
//!
//! Provides the command-line interface using clap, with commands for
//! separating and restoring text, masking documents into storage, and
//! working the variable queue.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands, QueueCommands};
