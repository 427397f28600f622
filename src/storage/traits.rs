//! Object store trait definition.
//!
//! Defines the narrow object-storage interface the pipeline persists
//! documents through, enabling pluggable storage backends.

use crate::core::QueueStats;
use crate::error::{Result, StorageError};
use serde::Serialize;

/// Trait for text object storage backends.
///
/// Objects are addressed by bucket and key. Buckets must exist before
/// objects can be written to them. Implementations are moved across threads
/// but not shared; wrap them in a mutex for concurrent use.
pub trait ObjectStore: Send {
    /// Creates the bucket if it does not exist.
    ///
    /// Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidBucketName`] for names that violate
    /// bucket naming rules, or a database error.
    fn ensure_bucket(&mut self, bucket: &str) -> Result<()>;

    /// Returns whether the bucket exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    /// Writes a text object, replacing any existing contents.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::BucketNotFound`] if the bucket does not exist.
    fn put_text_object(&mut self, bucket: &str, key: &str, contents: &str) -> Result<()>;

    /// Reads a text object.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::BucketNotFound`] or
    /// [`StorageError::ObjectNotFound`] if either is missing.
    fn get_text_object(&self, bucket: &str, key: &str) -> Result<String>;

    /// Lists objects in a bucket, ordered by key.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::BucketNotFound`] if the bucket does not exist.
    fn list_objects(&self, bucket: &str) -> Result<Vec<ObjectInfo>>;

    /// Deletes an object. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    fn delete_object(&mut self, bucket: &str, key: &str) -> Result<bool>;

    /// Gets storage statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if statistics cannot be gathered.
    fn stats(&self) -> Result<StorageStats>;
}

/// Summary of a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectInfo {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Size in bytes.
    pub size: usize,
    /// Unix timestamp of the last write.
    pub updated_at: i64,
}

/// Storage statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StorageStats {
    /// Number of buckets.
    pub bucket_count: usize,
    /// Number of stored objects.
    pub object_count: usize,
    /// Total size of object contents in bytes.
    pub total_object_size: usize,
    /// Job counts by status.
    pub jobs: QueueStats,
    /// Schema version.
    pub schema_version: u32,
    /// Database file size in bytes (if applicable).
    pub db_size: Option<u64>,
}

/// Validates a bucket name against S3 naming rules.
///
/// Names are 3 to 63 characters of lowercase letters, digits, `.` and `-`,
/// and start and end with a letter or digit.
///
/// # Errors
///
/// Returns [`StorageError::InvalidBucketName`] if the name is invalid.
///
/// # Examples
///
/// ```
/// use varsep::storage::validate_bucket_name;
///
/// assert!(validate_bucket_name("translations").is_ok());
/// assert!(validate_bucket_name("Bad_Name").is_err());
/// ```
pub fn validate_bucket_name(bucket: &str) -> Result<()> {
    let valid_chars = bucket
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'.' || b == b'-');
    let edges = |b: Option<u8>| b.is_some_and(|b| b.is_ascii_lowercase() || b.is_ascii_digit());

    if (3..=63).contains(&bucket.len())
        && valid_chars
        && edges(bucket.bytes().next())
        && edges(bucket.bytes().last())
        && !bucket.contains("..")
    {
        Ok(())
    } else {
        Err(StorageError::InvalidBucketName {
            bucket: bucket.to_string(),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("docs" ; "short")]
    #[test_case("my-bucket.v2" ; "dots and dashes")]
    #[test_case("abc" ; "minimum length")]
    fn test_valid_bucket_names(name: &str) {
        assert!(validate_bucket_name(name).is_ok());
    }

    #[test_case("ab" ; "too short")]
    #[test_case("UPPER" ; "uppercase")]
    #[test_case("-leading" ; "leading dash")]
    #[test_case("trailing." ; "trailing dot")]
    #[test_case("double..dot" ; "consecutive dots")]
    #[test_case("under_score" ; "underscore")]
    fn test_invalid_bucket_names(name: &str) {
        assert!(validate_bucket_name(name).is_err());
    }

    #[test]
    fn test_too_long_bucket_name() {
        assert!(validate_bucket_name(&"a".repeat(64)).is_err());
        assert!(validate_bucket_name(&"a".repeat(63)).is_ok());
    }
}
