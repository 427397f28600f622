//! Strategy traits for variable separation.
//!
//! A [`VariableSeparator`](crate::separation::VariableSeparator) is composed
//! from an extractor that locates variable spans and a hasher that derives
//! the placeholder hash for each span.

use crate::core::Span;

/// Locates variable spans in text.
///
/// Implementations must return spans in left-to-right order without
/// overlaps, and must be deterministic for the same input.
///
/// # Examples
///
/// ```
/// use varsep::separation::{RegexExtractor, VariableExtractor};
///
/// let extractor = RegexExtractor::preset("mustache").unwrap();
/// let spans = extractor.extract("Hi {{name}}!");
/// assert_eq!(spans[0].text, "{{name}}");
/// ```
pub trait VariableExtractor: Send + Sync {
    /// Returns the variable spans found in `text`.
    fn extract(&self, text: &str) -> Vec<Span>;

    /// Returns the name of the extraction strategy.
    fn name(&self) -> &str;

    /// Returns a description of the strategy.
    fn description(&self) -> &str {
        "No description available"
    }
}

/// Derives a content hash for a variable span.
///
/// Output must be lowercase hex of exactly [`hash_len`](Self::hash_len)
/// characters, and identical spans must always produce identical hashes.
pub trait SpanHasher: Send + Sync {
    /// Hashes a span.
    fn hash(&self, span: &str) -> String;

    /// Returns the number of hex digits produced by [`hash`](Self::hash).
    fn hash_len(&self) -> usize;

    /// Returns the name of the hashing strategy.
    fn name(&self) -> &'static str;
}
