//! Placeholder token format.
//!
//! A placeholder is `<prefix><hash><suffix>`, with the hash written as
//! lowercase hex of a fixed width. The default renders as `<VAR:1a2b3c4d5e6f>`.

use crate::error::{Result, SeparationError};
use regex::Regex;

/// Default placeholder prefix.
pub const DEFAULT_PREFIX: &str = "<VAR:";

/// Default placeholder suffix.
pub const DEFAULT_SUFFIX: &str = ">";

const HEX_DIGITS: &str = "0123456789abcdef";

/// Renders and recognizes placeholder tokens.
///
/// The first character of the prefix acts as the token's anchor: it must not
/// be a hex digit and must not appear anywhere else in the prefix or suffix.
/// Under that rule a placeholder can never partially overlap another one, so
/// restoration cannot pick up a token that straddles an inserted placeholder.
///
/// # Examples
///
/// ```
/// use varsep::separation::PlaceholderFormat;
///
/// let format = PlaceholderFormat::new("<VAR:", ">", 12).unwrap();
/// assert_eq!(format.render("0123456789ab"), "<VAR:0123456789ab>");
/// assert!(format.is_placeholder("<VAR:0123456789ab>"));
/// ```
#[derive(Debug, Clone)]
pub struct PlaceholderFormat {
    prefix: String,
    suffix: String,
    hash_len: usize,
    regex: Regex,
}

impl PlaceholderFormat {
    /// Creates a placeholder format for hashes of `hash_len` hex digits.
    ///
    /// # Errors
    ///
    /// Returns [`SeparationError::InvalidPlaceholder`] if the prefix or suffix
    /// is empty or the prefix anchor is ambiguous.
    pub fn new(prefix: &str, suffix: &str, hash_len: usize) -> Result<Self> {
        let Some(anchor) = prefix.chars().next() else {
            return Err(SeparationError::InvalidPlaceholder("prefix is empty".to_string()).into());
        };
        if suffix.is_empty() {
            return Err(SeparationError::InvalidPlaceholder("suffix is empty".to_string()).into());
        }
        if HEX_DIGITS.contains(anchor) {
            return Err(SeparationError::InvalidPlaceholder(format!(
                "prefix must not start with a hex digit: {prefix:?}"
            ))
            .into());
        }
        let repeats = prefix.chars().skip(1).chain(suffix.chars()).any(|c| c == anchor);
        if repeats {
            return Err(SeparationError::InvalidPlaceholder(format!(
                "{anchor:?} starts the prefix and may not appear again in {prefix:?}{suffix:?}"
            ))
            .into());
        }

        let pattern = format!(
            "{}([0-9a-f]{{{hash_len}}}){}",
            regex::escape(prefix),
            regex::escape(suffix)
        );
        let regex = Regex::new(&pattern).map_err(SeparationError::from)?;

        Ok(Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            hash_len,
            regex,
        })
    }

    /// Returns the prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the suffix.
    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Returns the hash width in hex digits.
    #[must_use]
    pub const fn hash_len(&self) -> usize {
        self.hash_len
    }

    /// Renders the placeholder for a hash.
    #[must_use]
    pub fn render(&self, hash: &str) -> String {
        let mut out = String::with_capacity(self.prefix.len() + hash.len() + self.suffix.len());
        out.push_str(&self.prefix);
        out.push_str(hash);
        out.push_str(&self.suffix);
        out
    }

    /// Returns true if `s` is a hash this format can carry: exactly
    /// `hash_len` lowercase hex digits.
    #[must_use]
    pub fn is_hash(&self, s: &str) -> bool {
        s.len() == self.hash_len && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// Returns true if `s` is exactly one placeholder.
    #[must_use]
    pub fn is_placeholder(&self, s: &str) -> bool {
        self.regex
            .find(s)
            .is_some_and(|m| m.start() == 0 && m.end() == s.len())
    }

    /// Returns the compiled placeholder regex. Capture group 1 is the hash.
    #[must_use]
    pub const fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Counts placeholder tokens in `text`.
    #[must_use]
    pub fn count(&self, text: &str) -> usize {
        self.regex.find_iter(text).count()
    }

    /// Returns the hashes of all placeholders in `text`, in order.
    #[must_use]
    pub fn hashes<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.regex
            .captures_iter(text)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_default_render() {
        let format = PlaceholderFormat::new(DEFAULT_PREFIX, DEFAULT_SUFFIX, 8).unwrap();
        assert_eq!(format.render("deadbeef"), "<VAR:deadbeef>");
        assert_eq!(format.hash_len(), 8);
    }

    #[test]
    fn test_count_and_hashes() {
        let format = PlaceholderFormat::new("<VAR:", ">", 4).unwrap();
        let text = "a <VAR:00ff> b <VAR:abcd> c <VAR:ABCD> <VAR:abc>";
        assert_eq!(format.count(text), 2);
        assert_eq!(format.hashes(text), vec!["00ff", "abcd"]);
    }

    #[test]
    fn test_is_placeholder() {
        let err = PlaceholderFormat::new("[[", "]]", 4).unwrap_err();
        assert!(err.to_string().contains("may not appear again"));

        let format = PlaceholderFormat::new("⟦", "⟧", 4).unwrap();
        assert!(format.is_placeholder("⟦0a1b⟧"));
        assert!(!format.is_placeholder("x⟦0a1b⟧"));
        assert!(!format.is_placeholder("⟦0a1b⟧x"));
    }

    #[test_case("0a1b", true ; "fits")]
    #[test_case("0a1b2c", false ; "too long")]
    #[test_case("0a1", false ; "too short")]
    #[test_case("0A1B", false ; "uppercase")]
    #[test_case("0a1g", false ; "not hex")]
    fn test_is_hash(hash: &str, expected: bool) {
        let format = PlaceholderFormat::new("<VAR:", ">", 4).unwrap();
        assert_eq!(format.is_hash(hash), expected);
    }

    #[test_case("", ">" ; "empty prefix")]
    #[test_case("<VAR:", "" ; "empty suffix")]
    #[test_case("a<", ">" ; "hex anchor")]
    #[test_case("<VAR:", "<" ; "anchor repeated in suffix")]
    #[test_case("<<", ">" ; "anchor repeated in prefix")]
    fn test_invalid_formats(prefix: &str, suffix: &str) {
        assert!(PlaceholderFormat::new(prefix, suffix, 12).is_err());
    }

    #[test]
    fn test_regex_metacharacters_escaped() {
        let format = PlaceholderFormat::new("$(", ")", 4).unwrap();
        assert_eq!(format.count("$(beef) $(x)"), 1);
    }
}
