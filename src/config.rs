//! Separator configuration.
//!
//! Loaded from a JSON file (`.varseprc.json`, found by walking up from the
//! working directory, or given explicitly). Command-line flags and
//! environment variables are applied on top.

use crate::error::{Error, IoError, Result};
use crate::separation::{
    DEFAULT_HASH_LEN, DEFAULT_PATTERN, DEFAULT_PREFIX, DEFAULT_SUFFIX, MAX_HASH_LEN, MIN_HASH_LEN,
    RegexExtractor, Sha256Hasher, UnmatchedPolicy, VariableSeparator, VariableExtractor,
    create_extractor,
};
use crate::queue::DEFAULT_STALE_AFTER;
use crate::storage::{DEFAULT_VARIABLES_BUCKET, validate_bucket_name};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration file name searched for in the working directory and its
/// parents.
pub const CONFIG_FILE_NAME: &str = ".varseprc.json";

/// Separator and pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeparatorConfig {
    /// Pattern preset name.
    #[serde(default = "default_pattern")]
    pub pattern: String,
    /// Custom regex; overrides `pattern` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    /// Hash width in hex digits.
    #[serde(default = "default_hash_length")]
    pub hash_length: usize,
    /// Placeholder prefix.
    #[serde(default = "default_prefix")]
    pub placeholder_prefix: String,
    /// Placeholder suffix.
    #[serde(default = "default_suffix")]
    pub placeholder_suffix: String,
    /// Unmatched placeholder policy.
    #[serde(default)]
    pub unmatched: UnmatchedPolicy,
    /// Queue operation timeout in milliseconds.
    #[serde(default = "default_queue_timeout_ms")]
    pub queue_timeout_ms: u64,
    /// Seconds a running job may go without updates before it is requeued.
    #[serde(default = "default_stale_job_secs")]
    pub stale_job_secs: u64,
    /// Bucket the worker stores variables in.
    #[serde(default = "default_variables_bucket")]
    pub variables_bucket: String,
}

fn default_pattern() -> String {
    DEFAULT_PATTERN.to_string()
}

const fn default_hash_length() -> usize {
    DEFAULT_HASH_LEN
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_suffix() -> String {
    DEFAULT_SUFFIX.to_string()
}

const fn default_queue_timeout_ms() -> u64 {
    5000
}

const fn default_stale_job_secs() -> u64 {
    DEFAULT_STALE_AFTER.as_secs()
}

fn default_variables_bucket() -> String {
    DEFAULT_VARIABLES_BUCKET.to_string()
}

impl Default for SeparatorConfig {
    fn default() -> Self {
        Self {
            pattern: default_pattern(),
            regex: None,
            hash_length: default_hash_length(),
            placeholder_prefix: default_prefix(),
            placeholder_suffix: default_suffix(),
            unmatched: UnmatchedPolicy::default(),
            queue_timeout_ms: default_queue_timeout_ms(),
            stale_job_secs: default_stale_job_secs(),
            variables_bucket: default_variables_bucket(),
        }
    }
}

impl SeparatorConfig {
    /// Validates configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_HASH_LEN..=MAX_HASH_LEN).contains(&self.hash_length) {
            return Err(config_error(format!(
                "'hashLength' must be between {MIN_HASH_LEN} and {MAX_HASH_LEN}, got {}",
                self.hash_length
            )));
        }
        if self.placeholder_prefix.is_empty() || self.placeholder_suffix.is_empty() {
            return Err(config_error(
                "'placeholderPrefix' and 'placeholderSuffix' must not be empty",
            ));
        }
        if self.queue_timeout_ms == 0 {
            return Err(config_error("'queueTimeoutMs' must be positive"));
        }
        validate_bucket_name(&self.variables_bucket)
            .map_err(|_| config_error(format!("invalid 'variablesBucket': {}", self.variables_bucket)))?;
        Ok(())
    }

    /// Applies command-line overrides. `None` keeps the current value.
    #[must_use]
    pub fn with_overrides(
        mut self,
        pattern: Option<&str>,
        regex: Option<&str>,
        hash_length: Option<usize>,
    ) -> Self {
        if let Some(pattern) = pattern {
            self.pattern = pattern.to_string();
            // an explicit preset replaces a regex from the file
            self.regex = None;
        }
        if let Some(regex) = regex {
            self.regex = Some(regex.to_string());
        }
        if let Some(len) = hash_length {
            self.hash_length = len;
        }
        self
    }

    /// Returns the queue timeout.
    #[must_use]
    pub const fn queue_timeout(&self) -> Duration {
        Duration::from_millis(self.queue_timeout_ms)
    }

    /// Returns the idle time after which a running job is requeued.
    #[must_use]
    pub const fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_job_secs)
    }

    /// Builds a separator from this configuration.
    ///
    /// # Errors
    ///
    /// Returns validation errors, pattern errors, or placeholder format errors.
    pub fn build_separator(&self) -> Result<VariableSeparator> {
        self.validate()?;

        let extractor: Box<dyn VariableExtractor> = match &self.regex {
            Some(regex) => Box::new(RegexExtractor::custom(regex)?),
            None => create_extractor(&self.pattern)?,
        };

        VariableSeparator::builder()
            .boxed_extractor(extractor)
            .hasher(Sha256Hasher::with_len(self.hash_length)?)
            .placeholder(&self.placeholder_prefix, &self.placeholder_suffix)
            .unmatched_policy(self.unmatched)
            .build()
    }
}

fn config_error(message: impl Into<String>) -> Error {
    Error::Config {
        message: message.into(),
    }
}

/// Returns the default configuration as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn default_config_json() -> Result<String> {
    serde_json::to_string_pretty(&SeparatorConfig::default())
        .map_err(|e| config_error(format!("failed to generate default config: {e}")))
}

/// Searches `start_dir` and its parents for [`CONFIG_FILE_NAME`], stopping
/// at a repository root.
#[must_use]
pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if current.join(".git").exists() {
            return None;
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// Loaded configuration.
    pub config: SeparatorConfig,
    /// File the configuration came from, if any.
    pub source: Option<PathBuf>,
}

/// Loads and validates configuration from an explicit file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, or validated.
pub fn load_config_file(path: &Path) -> Result<SeparatorConfig> {
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.display().to_string(),
        }
        .into());
    }
    let content = fs::read_to_string(path).map_err(|e| IoError::ReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let config: SeparatorConfig = serde_json::from_str(&content).map_err(|e| {
        config_error(format!("failed to parse config file {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Loads configuration from `explicit` when given, otherwise from the
/// nearest [`CONFIG_FILE_NAME`] above `start_dir`, otherwise defaults.
///
/// # Errors
///
/// Returns an error if a found file cannot be read, parsed, or validated.
pub fn load_config(explicit: Option<&Path>, start_dir: &Path) -> Result<ConfigLoadResult> {
    let source = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file(start_dir),
    };

    match source {
        Some(path) => {
            let config = load_config_file(&path)?;
            tracing::debug!(path = %path.display(), "loaded configuration");
            Ok(ConfigLoadResult {
                config,
                source: Some(path),
            })
        }
        None => Ok(ConfigLoadResult {
            config: SeparatorConfig::default(),
            source: None,
        }),
    }
}
