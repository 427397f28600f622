//! Regex-based variable extraction.
//!
//! Ships a set of named presets for common template syntaxes and accepts
//! arbitrary custom patterns.

use crate::core::Span;
use crate::error::{Result, SeparationError};
use crate::separation::traits::VariableExtractor;
use regex::Regex;

/// A named variable pattern preset.
#[derive(Debug, Clone, Copy)]
pub struct PatternPreset {
    /// Preset name.
    pub name: &'static str,
    /// Regular expression.
    pub regex: &'static str,
    /// Example of a matched variable.
    pub example: &'static str,
    /// Short description.
    pub description: &'static str,
}

/// Built-in pattern presets. The first entry is the default.
pub const PATTERN_PRESETS: &[PatternPreset] = &[
    PatternPreset {
        name: "mustache",
        regex: r"\{\{.*?\}\}",
        example: "{{name}}",
        description: "Double-brace templates (Handlebars, Jinja, Vue)",
    },
    PatternPreset {
        name: "brace",
        regex: r"\{(?:[A-Za-z_][A-Za-z0-9_.]*|[0-9]+)\}",
        example: "{count}",
        description: "Single-brace named or positional arguments (ICU, .NET, Python format)",
    },
    PatternPreset {
        name: "dollar",
        regex: r"\$\{.*?\}",
        example: "${user}",
        description: "Dollar-brace interpolation (JavaScript, shell)",
    },
    PatternPreset {
        name: "printf",
        regex: r"%(?:[0-9]+\$)?[-+ 0#]*[0-9]*(?:\.[0-9]+)?[sdifuxXeEgGcp@%]",
        example: "%1$s",
        description: "printf-style conversions",
    },
    PatternPreset {
        name: "percent",
        regex: r"%[A-Za-z_][A-Za-z0-9_]*%",
        example: "%name%",
        description: "Percent-delimited names (Windows, some CMS)",
    },
];

/// Name of the default preset.
pub const DEFAULT_PATTERN: &str = "mustache";

/// Finds a preset by name (case-insensitive).
#[must_use]
pub fn find_preset(name: &str) -> Option<&'static PatternPreset> {
    PATTERN_PRESETS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Extracts variables with a regular expression.
///
/// Matches are leftmost-first and non-overlapping. Empty matches are
/// skipped since they carry no text to protect.
///
/// # Examples
///
/// ```
/// use varsep::separation::{RegexExtractor, VariableExtractor};
///
/// let extractor = RegexExtractor::custom(r"\[\w+\]").unwrap();
/// let spans = extractor.extract("[a] and [b]");
/// assert_eq!(spans.len(), 2);
/// assert_eq!(spans[1].range, 8..11);
/// ```
#[derive(Debug, Clone)]
pub struct RegexExtractor {
    name: String,
    description: String,
    regex: Regex,
}

impl RegexExtractor {
    /// Creates an extractor from a named preset.
    ///
    /// # Errors
    ///
    /// Returns [`SeparationError::UnknownPattern`] if no preset has that name.
    pub fn preset(name: &str) -> Result<Self> {
        let preset = find_preset(name).ok_or_else(|| SeparationError::UnknownPattern {
            name: name.to_string(),
        })?;
        let regex = Regex::new(preset.regex).map_err(SeparationError::from)?;
        Ok(Self {
            name: preset.name.to_string(),
            description: preset.description.to_string(),
            regex,
        })
    }

    /// Creates an extractor from a custom regular expression.
    ///
    /// # Errors
    ///
    /// Returns [`SeparationError::InvalidPattern`] if the regex does not compile.
    pub fn custom(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(SeparationError::from)?;
        Ok(Self {
            name: "custom".to_string(),
            description: format!("Custom pattern {pattern}"),
            regex,
        })
    }

    /// Returns the underlying pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}

impl VariableExtractor for RegexExtractor {
    fn extract(&self, text: &str) -> Vec<Span> {
        self.regex
            .find_iter(text)
            .filter(|m| !m.is_empty())
            .map(|m| Span::new(m.range(), m.as_str()))
            .collect()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn texts(extractor: &RegexExtractor, input: &str) -> Vec<String> {
        extractor
            .extract(input)
            .into_iter()
            .map(|s| s.text)
            .collect()
    }

    #[test_case("mustache", "Hello {{name}}, code {{ code }}.", &["{{name}}", "{{ code }}"] ; "mustache basic")]
    #[test_case("mustache", "{{a}}{{b}}", &["{{a}}", "{{b}}"] ; "adjacent mustache")]
    #[test_case("brace", "You have {count} new {0} items {not valid}", &["{count}", "{0}"] ; "brace named and positional")]
    #[test_case("dollar", "echo ${HOME} and ${user.name}", &["${HOME}", "${user.name}"] ; "dollar")]
    #[test_case("printf", "%s has %d items (%.2f%%) %1$s", &["%s", "%d", "%.2f", "%%", "%1$s"] ; "printf conversions")]
    #[test_case("percent", "Path %APPDATA% and 50% off", &["%APPDATA%"] ; "percent names")]
    fn test_presets(name: &str, input: &str, expected: &[&str]) {
        let extractor = RegexExtractor::preset(name).unwrap();
        assert_eq!(texts(&extractor, input), expected);
    }

    #[test]
    fn test_mustache_is_non_greedy() {
        let extractor = RegexExtractor::preset("mustache").unwrap();
        let spans = extractor.extract("{{a}} middle {{b}}");
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].range, 0..5);
        assert_eq!(spans[1].range, 13..18);
    }

    #[test]
    fn test_preset_lookup_case_insensitive() {
        let extractor = RegexExtractor::preset("MUSTACHE").unwrap();
        assert_eq!(extractor.name(), "mustache");
    }

    #[test]
    fn test_unknown_preset() {
        let err = RegexExtractor::preset("nope").unwrap_err();
        assert!(err.to_string().contains("unknown variable pattern"));
    }

    #[test]
    fn test_invalid_custom_pattern() {
        assert!(RegexExtractor::custom("(unclosed").is_err());
    }

    #[test]
    fn test_empty_matches_skipped() {
        let extractor = RegexExtractor::custom("x*").unwrap();
        let spans = extractor.extract("abxxc");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "xx");
    }

    #[test]
    fn test_multibyte_offsets() {
        let extractor = RegexExtractor::preset("mustache").unwrap();
        let text = "héllo {{nom}}";
        let spans = extractor.extract(text);
        assert_eq!(&text[spans[0].range.clone()], "{{nom}}");
    }

    #[test]
    fn test_default_preset_is_first() {
        assert_eq!(PATTERN_PRESETS[0].name, DEFAULT_PATTERN);
    }
}
