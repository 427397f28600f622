//! The variable separator.
//!
//! Masks variable spans behind hash placeholders and restores them.

use crate::core::{SeparationResult, Span, Variable};
use crate::error::{RestoreError, Result, SeparationError};
use crate::separation::extractor::{DEFAULT_PATTERN, RegexExtractor};
use crate::separation::hasher::Sha256Hasher;
use crate::separation::placeholder::{DEFAULT_PREFIX, DEFAULT_SUFFIX, PlaceholderFormat};
use crate::separation::traits::{SpanHasher, VariableExtractor};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// What restoration does with a placeholder whose hash is unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmatchedPolicy {
    /// Fail with [`RestoreError::UnmatchedPlaceholder`].
    #[default]
    Strict,
    /// Leave the placeholder in place and log a warning.
    Keep,
}

/// Reversible masking of variable spans.
///
/// Separation scans text with the configured extractor, replaces each span
/// with a placeholder derived from the span's hash, and records the
/// original span. Restoration is the exact inverse.
///
/// Placeholder-shaped text already present in the input is masked as a
/// variable too, so restoration always reproduces the input byte for byte.
///
/// # Examples
///
/// ```
/// use varsep::separation::VariableSeparator;
///
/// let separator = VariableSeparator::builder().build().unwrap();
/// let text = "Hello {{name}}, your code is {{code}}.";
/// let result = separator.separate_variables(text).unwrap();
/// assert_eq!(result.variables.len(), 2);
/// assert!(!result.processed_text.contains("{{"));
///
/// let restored = separator
///     .restore_variables(&result.processed_text, &result.variables)
///     .unwrap();
/// assert_eq!(restored, text);
/// ```
pub struct VariableSeparator {
    extractor: Box<dyn VariableExtractor>,
    hasher: Box<dyn SpanHasher>,
    placeholder: PlaceholderFormat,
    policy: UnmatchedPolicy,
}

impl std::fmt::Debug for VariableSeparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariableSeparator")
            .field("extractor", &self.extractor.name())
            .field("hasher", &self.hasher.name())
            .field("placeholder", &self.placeholder.render("…"))
            .field("policy", &self.policy)
            .finish()
    }
}

impl VariableSeparator {
    /// Starts building a separator. Defaults: mustache pattern, 12-digit
    /// SHA-256 hashes, `<VAR:…>` placeholders, strict restoration.
    #[must_use]
    pub fn builder() -> VariableSeparatorBuilder {
        VariableSeparatorBuilder::default()
    }

    /// Returns the extractor.
    #[must_use]
    pub fn extractor(&self) -> &dyn VariableExtractor {
        self.extractor.as_ref()
    }

    /// Returns the hasher.
    #[must_use]
    pub fn hasher(&self) -> &dyn SpanHasher {
        self.hasher.as_ref()
    }

    /// Returns the placeholder format.
    #[must_use]
    pub const fn placeholder(&self) -> &PlaceholderFormat {
        &self.placeholder
    }

    /// Returns the unmatched-placeholder policy.
    #[must_use]
    pub const fn policy(&self) -> UnmatchedPolicy {
        self.policy
    }

    /// Hashes a span with the configured hasher.
    #[must_use]
    pub fn generate_hash(&self, span: &str) -> String {
        self.hasher.hash(span)
    }

    /// Returns the spans that separation would mask, in order.
    ///
    /// This merges the extractor's spans with literal placeholder tokens in
    /// the input. Where spans overlap, the earlier one wins; at equal starts
    /// the longer one wins.
    #[must_use]
    pub fn extract_variables(&self, text: &str) -> Vec<Span> {
        let mut candidates: Vec<Span> = self
            .placeholder
            .regex()
            .find_iter(text)
            .map(|m| Span::new(m.range(), m.as_str()))
            .chain(self.extractor.extract(text))
            .filter(|s| !s.range.is_empty())
            .collect();

        candidates.sort_by(|a, b| a.start().cmp(&b.start()).then(b.end().cmp(&a.end())));

        let mut spans = Vec::with_capacity(candidates.len());
        let mut cursor = 0;
        for span in candidates {
            if span.start() >= cursor {
                cursor = span.end();
                spans.push(span);
            }
        }
        spans
    }

    /// Replaces every variable span with its placeholder.
    ///
    /// # Errors
    ///
    /// Returns [`SeparationError::HashCollision`] if two distinct spans hash
    /// to the same value.
    pub fn separate_variables(&self, text: &str) -> Result<SeparationResult> {
        let spans = self.extract_variables(text);

        let mut processed = String::with_capacity(text.len());
        let mut variables = Vec::with_capacity(spans.len());
        let mut seen: HashMap<String, &str> = HashMap::new();
        let mut last = 0;

        for span in &spans {
            let hash = self.hasher.hash(&span.text);
            match seen.entry(hash.clone()) {
                Entry::Occupied(existing) if *existing.get() != span.text => {
                    return Err(SeparationError::HashCollision {
                        hash,
                        first: (*existing.get()).to_string(),
                        second: span.text.clone(),
                    }
                    .into());
                }
                Entry::Occupied(_) => {}
                Entry::Vacant(slot) => {
                    slot.insert(&span.text);
                }
            }

            processed.push_str(&text[last..span.start()]);
            processed.push_str(&self.placeholder.render(&hash));
            last = span.end();
            variables.push(Variable::new(hash, span.text.clone()));
        }
        processed.push_str(&text[last..]);

        tracing::debug!(
            extractor = self.extractor.name(),
            variables = variables.len(),
            distinct = seen.len(),
            "separated variables"
        );

        Ok(SeparationResult {
            processed_text: processed,
            variables,
        })
    }

    /// Separates many texts in parallel. Results keep input order.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered.
    pub fn separate_batch<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Result<Vec<SeparationResult>> {
        texts
            .par_iter()
            .map(|t| self.separate_variables(t.as_ref()))
            .collect()
    }

    /// Replaces every placeholder with the value of its variable.
    ///
    /// # Errors
    ///
    /// Returns [`RestoreError::MalformedHash`] if a variable's hash could
    /// never appear in this separator's placeholders (for example one
    /// produced with another hash width),
    /// [`RestoreError::ConflictingVariable`] if `variables` maps one hash to
    /// two values, and [`RestoreError::UnmatchedPlaceholder`] for an unknown
    /// hash under [`UnmatchedPolicy::Strict`].
    pub fn restore_variables(&self, text: &str, variables: &[Variable]) -> Result<String> {
        let mut lookup: HashMap<&str, &str> = HashMap::with_capacity(variables.len());
        for var in variables {
            if !self.placeholder.is_hash(&var.hash) {
                return Err(RestoreError::MalformedHash {
                    hash: var.hash.clone(),
                    expected: self.placeholder.hash_len(),
                }
                .into());
            }
            if let Some(previous) = lookup.insert(var.hash.as_str(), var.value.as_str())
                && previous != var.value
            {
                return Err(RestoreError::ConflictingVariable {
                    hash: var.hash.clone(),
                }
                .into());
            }
        }

        let mut restored = String::with_capacity(text.len());
        let mut last = 0;
        let mut kept = 0usize;

        for caps in self.placeholder.regex().captures_iter(text) {
            let (Some(whole), Some(hash)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            restored.push_str(&text[last..whole.start()]);
            match lookup.get(hash.as_str()) {
                Some(value) => restored.push_str(value),
                None => match self.policy {
                    UnmatchedPolicy::Strict => {
                        return Err(RestoreError::UnmatchedPlaceholder {
                            hash: hash.as_str().to_string(),
                        }
                        .into());
                    }
                    UnmatchedPolicy::Keep => {
                        tracing::warn!(hash = hash.as_str(), "keeping unmatched placeholder");
                        kept += 1;
                        restored.push_str(whole.as_str());
                    }
                },
            }
            last = whole.end();
        }
        restored.push_str(&text[last..]);

        tracing::debug!(variables = lookup.len(), kept, "restored variables");
        Ok(restored)
    }

    /// Counts placeholders in `text`.
    #[must_use]
    pub fn placeholder_count(&self, text: &str) -> usize {
        self.placeholder.count(text)
    }
}

/// Builder for [`VariableSeparator`].
#[derive(Default)]
pub struct VariableSeparatorBuilder {
    extractor: Option<Box<dyn VariableExtractor>>,
    hasher: Option<Box<dyn SpanHasher>>,
    prefix: Option<String>,
    suffix: Option<String>,
    policy: UnmatchedPolicy,
}

impl VariableSeparatorBuilder {
    /// Sets the extraction strategy.
    #[must_use]
    pub fn extractor(mut self, extractor: impl VariableExtractor + 'static) -> Self {
        self.extractor = Some(Box::new(extractor));
        self
    }

    /// Sets a boxed extraction strategy.
    #[must_use]
    pub fn boxed_extractor(mut self, extractor: Box<dyn VariableExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Sets the hashing strategy.
    #[must_use]
    pub fn hasher(mut self, hasher: impl SpanHasher + 'static) -> Self {
        self.hasher = Some(Box::new(hasher));
        self
    }

    /// Sets the placeholder prefix and suffix.
    #[must_use]
    pub fn placeholder(mut self, prefix: &str, suffix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self.suffix = Some(suffix.to_string());
        self
    }

    /// Sets the unmatched-placeholder policy.
    #[must_use]
    pub const fn unmatched_policy(mut self, policy: UnmatchedPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Builds the separator.
    ///
    /// # Errors
    ///
    /// Returns an error if the default pattern or the placeholder format is
    /// invalid.
    pub fn build(self) -> Result<VariableSeparator> {
        let extractor = match self.extractor {
            Some(e) => e,
            None => Box::new(RegexExtractor::preset(DEFAULT_PATTERN)?),
        };
        let hasher = self
            .hasher
            .unwrap_or_else(|| Box::new(Sha256Hasher::new()));
        let placeholder = PlaceholderFormat::new(
            self.prefix.as_deref().unwrap_or(DEFAULT_PREFIX),
            self.suffix.as_deref().unwrap_or(DEFAULT_SUFFIX),
            hasher.hash_len(),
        )?;

        Ok(VariableSeparator {
            extractor,
            hasher,
            placeholder,
            policy: self.policy,
        })
    }
}
