//! Document masking pipeline.
//!
//! Masks a document, persists the masked text together with a variable
//! manifest, and restores (translated) documents from storage. Enqueueing
//! the variables is left to the caller via [`crate::queue::enqueue_variables`].

use crate::core::{SeparationResult, Variable};
use crate::error::{Error, Result, StorageError};
use crate::separation::{PlaceholderFormat, VariableSeparator};
use crate::storage::ObjectStore;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Suffix appended to a document key to name its manifest.
pub const MANIFEST_SUFFIX: &str = ".variables.json";

/// Returns the manifest key for a document key.
///
/// # Examples
///
/// ```
/// use varsep::pipeline::manifest_key;
///
/// assert_eq!(manifest_key("docs/intro.md"), "docs/intro.md.variables.json");
/// ```
#[must_use]
pub fn manifest_key(key: &str) -> String {
    format!("{key}{MANIFEST_SUFFIX}")
}

/// Placeholder delimiters recorded in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderSpec {
    /// Placeholder prefix.
    pub prefix: String,
    /// Placeholder suffix.
    pub suffix: String,
    /// Hash width in hex digits.
    pub hash_len: usize,
}

impl PlaceholderSpec {
    fn matches(&self, format: &PlaceholderFormat) -> bool {
        self.prefix == format.prefix()
            && self.suffix == format.suffix()
            && self.hash_len == format.hash_len()
    }
}

/// Variables of a masked document, persisted next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableManifest {
    /// Key of the masked document.
    pub source_key: String,
    /// Placeholder delimiters used when masking.
    pub placeholder: PlaceholderSpec,
    /// Variables in encounter order.
    pub variables: Vec<Variable>,
}

impl VariableManifest {
    /// Builds a manifest from a separation result.
    #[must_use]
    pub fn new(source_key: &str, separator: &VariableSeparator, result: &SeparationResult) -> Self {
        Self {
            source_key: source_key.to_string(),
            placeholder: PlaceholderSpec {
                prefix: separator.placeholder().prefix().to_string(),
                suffix: separator.placeholder().suffix().to_string(),
                hash_len: separator.placeholder().hash_len(),
            },
            variables: result.variables.clone(),
        }
    }
}

/// A document masked into storage.
#[derive(Debug, Clone, Serialize)]
pub struct MaskedDocument {
    /// Bucket holding the document.
    pub bucket: String,
    /// Key of the masked text.
    pub key: String,
    /// Key of the manifest.
    pub manifest_key: String,
    /// Separation output.
    pub result: SeparationResult,
}

/// Masks `text` and stores the masked text under `key` and its manifest
/// under [`manifest_key`]. The bucket is created when missing.
///
/// # Errors
///
/// Returns separation errors or storage errors.
pub fn mask_document<S>(
    separator: &VariableSeparator,
    store: &mut S,
    bucket: &str,
    key: &str,
    text: &str,
) -> Result<MaskedDocument>
where
    S: ObjectStore + ?Sized,
{
    let result = separator.separate_variables(text)?;
    let manifest = VariableManifest::new(key, separator, &result);
    let manifest_json = serde_json::to_string_pretty(&manifest).map_err(StorageError::from)?;
    let manifest_key = manifest_key(key);

    store.ensure_bucket(bucket)?;
    store.put_text_object(bucket, key, &result.processed_text)?;
    store.put_text_object(bucket, &manifest_key, &manifest_json)?;

    tracing::info!(
        bucket,
        key,
        variables = result.len(),
        "stored masked document"
    );

    Ok(MaskedDocument {
        bucket: bucket.to_string(),
        key: key.to_string(),
        manifest_key,
        result,
    })
}

/// Loads the manifest of a masked document.
///
/// # Errors
///
/// Returns storage errors, or [`StorageError::Serialization`] if the
/// manifest is malformed.
pub fn load_manifest<S>(store: &S, bucket: &str, key: &str) -> Result<VariableManifest>
where
    S: ObjectStore + ?Sized,
{
    let json = store.get_text_object(bucket, &manifest_key(key))?;
    Ok(serde_json::from_str(&json).map_err(StorageError::from)?)
}

/// Restores a document using the manifest stored for `key`.
///
/// The text is read from `from_key` when given (for example a translated
/// copy of the masked document), otherwise from `key`. Placeholders that
/// the text lost are logged.
///
/// # Errors
///
/// Returns storage errors, restore errors, or a configuration error if the
/// manifest was written with different placeholder delimiters or hash width.
pub fn unmask_document<S>(
    separator: &VariableSeparator,
    store: &S,
    bucket: &str,
    key: &str,
    from_key: Option<&str>,
) -> Result<String>
where
    S: ObjectStore + ?Sized,
{
    let manifest = load_manifest(store, bucket, key)?;
    let format = separator.placeholder();
    if !manifest.placeholder.matches(format) {
        let spec = &manifest.placeholder;
        return Err(Error::Config {
            message: format!(
                "{key} was masked with placeholder {}…{} ({} hex digits), separator uses {}…{} ({} hex digits)",
                spec.prefix,
                spec.suffix,
                spec.hash_len,
                format.prefix(),
                format.suffix(),
                format.hash_len()
            ),
        });
    }

    let text_key = from_key.unwrap_or(key);
    let text = store.get_text_object(bucket, text_key)?;

    let missing = missing_placeholders(separator, &text, &manifest.variables);
    if !missing.is_empty() {
        tracing::warn!(key = text_key, missing = ?missing, "document lost placeholders");
    }

    separator.restore_variables(&text, &manifest.variables)
}

/// Returns the hashes of `variables` with no placeholder left in `text`,
/// in encounter order.
#[must_use]
pub fn missing_placeholders(
    separator: &VariableSeparator,
    text: &str,
    variables: &[Variable],
) -> Vec<String> {
    let present: HashSet<&str> = separator.placeholder().hashes(text).into_iter().collect();
    let mut reported = HashSet::new();
    variables
        .iter()
        .filter(|v| !present.contains(v.hash.as_str()) && reported.insert(v.hash.as_str()))
        .map(|v| v.hash.clone())
        .collect()
}
