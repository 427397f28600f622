//! Unicode helpers for reading documents and rendering variable previews.

use unicode_segmentation::UnicodeSegmentation;

/// Validates that a byte slice is valid UTF-8.
///
/// # Errors
///
/// Returns the byte offset of the first invalid UTF-8 sequence.
pub fn validate_utf8(bytes: &[u8]) -> std::result::Result<&str, usize> {
    std::str::from_utf8(bytes).map_err(|e| e.valid_up_to())
}

/// Truncates a string at a grapheme cluster boundary.
///
/// # Examples
///
/// ```
/// use varsep::io::truncate_graphemes;
///
/// assert_eq!(truncate_graphemes("{{prénom}}", 5), "{{pré");
/// ```
#[must_use]
pub fn truncate_graphemes(s: &str, max_graphemes: usize) -> &str {
    let end_byte = s
        .grapheme_indices(true)
        .nth(max_graphemes)
        .map_or(s.len(), |(idx, _)| idx);
    &s[..end_byte]
}

/// Renders a single-line preview of a variable, at most `max_graphemes`
/// long, with an ellipsis when shortened. Control characters are escaped.
#[must_use]
pub fn preview(s: &str, max_graphemes: usize) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_control() {
            escaped.extend(c.escape_default());
        } else {
            escaped.push(c);
        }
    }
    let truncated = truncate_graphemes(&escaped, max_graphemes.saturating_sub(1));
    if truncated.len() < escaped.len() {
        format!("{truncated}…")
    } else {
        escaped
    }
}
