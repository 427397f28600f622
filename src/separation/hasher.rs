//! Content hashing for variable spans.
//!
//! Hashes are SHA-256 digests rendered as lowercase hex and truncated to a
//! configurable width. At the default width of 12 hex digits (48 bits) the
//! chance of any collision among 10,000 distinct spans is below 2e-7.

use crate::error::{Result, SeparationError};
use crate::separation::traits::SpanHasher;
use crate::separation::{DEFAULT_HASH_LEN, MAX_HASH_LEN, MIN_HASH_LEN};
use sha2::{Digest, Sha256};

/// SHA-256 span hasher with truncated hex output.
///
/// # Examples
///
/// ```
/// use varsep::separation::{Sha256Hasher, SpanHasher};
///
/// let hasher = Sha256Hasher::new();
/// let a = hasher.hash("{{name}}");
/// assert_eq!(a.len(), 12);
/// assert_eq!(a, hasher.hash("{{name}}"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Sha256Hasher {
    len: usize,
}

impl Default for Sha256Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Sha256Hasher {
    /// Creates a hasher with the default width.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            len: DEFAULT_HASH_LEN,
        }
    }

    /// Creates a hasher producing `len` hex digits.
    ///
    /// # Errors
    ///
    /// Returns [`SeparationError::InvalidHashLength`] if `len` is outside
    /// `MIN_HASH_LEN..=MAX_HASH_LEN`.
    pub fn with_len(len: usize) -> Result<Self> {
        if !(MIN_HASH_LEN..=MAX_HASH_LEN).contains(&len) {
            return Err(SeparationError::InvalidHashLength {
                len,
                min: MIN_HASH_LEN,
                max: MAX_HASH_LEN,
            }
            .into());
        }
        Ok(Self { len })
    }
}

impl SpanHasher for Sha256Hasher {
    fn hash(&self, span: &str) -> String {
        let digest = Sha256::digest(span.as_bytes());
        let mut hex = format!("{digest:x}");
        hex.truncate(self.len);
        hex
    }

    fn hash_len(&self) -> usize {
        self.len
    }

    fn name(&self) -> &'static str {
        "sha256"
    }
}
