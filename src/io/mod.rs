//! I/O utilities for varsep.
//!
//! Document reading with memory mapping for large files, stdin input, and
//! Unicode helpers for output.

pub mod reader;
pub mod unicode;

pub use reader::{FileReader, read_file, read_input, write_file};
pub use unicode::{preview, truncate_graphemes, validate_utf8};
