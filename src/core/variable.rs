//! Variable and separation result models.
//!
//! A variable is a template span (for example `{{name}}`) that must pass
//! through translation unchanged. Separation replaces each span with a
//! placeholder that encodes the span's content hash.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Range;

/// A masked variable: the hash used in its placeholder and the original span.
///
/// # Examples
///
/// ```
/// use varsep::core::Variable;
///
/// let var = Variable::new("a1b2c3d4e5f6", "{{name}}");
/// assert_eq!(var.value, "{{name}}");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variable {
    /// Content hash of `value`.
    pub hash: String,
    /// Original span text.
    pub value: String,
}

impl Variable {
    /// Creates a new variable.
    #[must_use]
    pub fn new(hash: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            value: value.into(),
        }
    }
}

/// A variable span located in source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Byte range in the source text.
    pub range: Range<usize>,
    /// Matched text.
    pub text: String,
}

impl Span {
    /// Creates a span from a byte range and its text.
    #[must_use]
    pub fn new(range: Range<usize>, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }

    /// Returns the start byte offset.
    #[must_use]
    pub const fn start(&self) -> usize {
        self.range.start
    }

    /// Returns the end byte offset.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.range.end
    }
}

/// Output of one separation call.
///
/// `processed_text` holds exactly one placeholder per entry of `variables`,
/// in the order the spans were encountered. Repeated spans appear once per
/// occurrence and share a hash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeparationResult {
    /// Text with every variable span replaced by a placeholder.
    pub processed_text: String,
    /// Variables in left-to-right order of occurrence.
    pub variables: Vec<Variable>,
}

impl SeparationResult {
    /// Returns the number of masked occurrences.
    #[must_use]
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Returns true when nothing was masked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Returns the variables with duplicate hashes removed, first occurrence kept.
    #[must_use]
    pub fn distinct_variables(&self) -> Vec<&Variable> {
        let mut seen = std::collections::HashSet::new();
        self.variables
            .iter()
            .filter(|v| seen.insert(v.hash.as_str()))
            .collect()
    }

    /// Builds a hash to value lookup table.
    #[must_use]
    pub fn lookup(&self) -> HashMap<&str, &str> {
        self.variables
            .iter()
            .map(|v| (v.hash.as_str(), v.value.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SeparationResult {
        SeparationResult {
            processed_text: "<VAR:aaa> <VAR:bbb> <VAR:aaa>".to_string(),
            variables: vec![
                Variable::new("aaa", "{{x}}"),
                Variable::new("bbb", "{{y}}"),
                Variable::new("aaa", "{{x}}"),
            ],
        }
    }

    #[test]
    fn test_distinct_variables_keeps_first_order() {
        let result = sample();
        let distinct = result.distinct_variables();
        assert_eq!(distinct.len(), 2);
        assert_eq!(distinct[0].hash, "aaa");
        assert_eq!(distinct[1].hash, "bbb");
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_lookup() {
        let result = sample();
        let lookup = result.lookup();
        assert_eq!(lookup.get("bbb"), Some(&"{{y}}"));
        assert_eq!(lookup.len(), 2);
    }

    #[test]
    fn test_serde_shape() {
        let var = Variable::new("abc", "{{name}}");
        let json = serde_json::to_string(&var).unwrap();
        assert_eq!(json, r#"{"hash":"abc","value":"{{name}}"}"#);
    }

    #[test]
    fn test_span_offsets() {
        let span = Span::new(6..14, "{{name}}");
        assert_eq!(span.start(), 6);
        assert_eq!(span.end(), 14);
    }

    #[test]
    fn test_empty_result() {
        let result = SeparationResult::default();
        assert!(result.is_empty());
        assert!(result.distinct_variables().is_empty());
    }
}
