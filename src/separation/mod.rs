//! Variable separation for varsep.
//!
//! This module provides reversible masking of template variables. The
//! separator is composed from two strategies:
//!
//! - **Extractor**: locates variable spans (regex presets or custom patterns)
//! - **Hasher**: derives the content hash encoded in each placeholder

pub mod extractor;
pub mod hasher;
pub mod placeholder;
pub mod separator;
pub mod traits;

pub use extractor::{DEFAULT_PATTERN, PATTERN_PRESETS, PatternPreset, RegexExtractor, find_preset};
pub use hasher::Sha256Hasher;
pub use placeholder::{DEFAULT_PREFIX, DEFAULT_SUFFIX, PlaceholderFormat};
pub use separator::{UnmatchedPolicy, VariableSeparator, VariableSeparatorBuilder};
pub use traits::{SpanHasher, VariableExtractor};

/// Default hash width in hex digits (48 bits).
pub const DEFAULT_HASH_LEN: usize = 12;

/// Minimum hash width in hex digits.
pub const MIN_HASH_LEN: usize = 8;

/// Maximum hash width in hex digits (a full SHA-256 digest).
pub const MAX_HASH_LEN: usize = 64;

/// Creates an extractor by preset name.
///
/// # Errors
///
/// Returns [`crate::error::SeparationError::UnknownPattern`] if the name is
/// not a known preset.
pub fn create_extractor(name: &str) -> crate::error::Result<Box<dyn VariableExtractor>> {
    Ok(Box::new(RegexExtractor::preset(name)?))
}

/// Lists available pattern preset names.
#[must_use]
pub fn available_patterns() -> Vec<&'static str> {
    PATTERN_PRESETS.iter().map(|p| p.name).collect()
}
