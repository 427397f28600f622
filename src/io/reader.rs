//! Document reading and writing.
//!
//! Large documents are read through a memory map; small ones are read
//! directly. Input can also come from stdin.

// Memory mapping requires unsafe but is sound for read-only access
#![allow(unsafe_code)]

use crate::error::{IoError, Result};
use memmap2::Mmap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Threshold for using memory mapping (1MB).
const MMAP_THRESHOLD: u64 = 1024 * 1024;

/// Maximum document size (1GB).
const MAX_FILE_SIZE: u64 = 1024 * 1024 * 1024;

/// Document reader.
///
/// Chooses the reading strategy by file size:
/// - Small files (< 1MB): read directly
/// - Large files (>= 1MB): memory mapped
///
/// # Examples
///
/// ```no_run
/// use varsep::io::FileReader;
///
/// let reader = FileReader::open("messages.txt").unwrap();
/// let text = reader.read_to_string().unwrap();
/// ```
#[derive(Debug)]
pub struct FileReader {
    file: File,
    size: u64,
    path: String,
}

impl FileReader {
    /// Opens a file for reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the file doesn't exist, can't be opened, or
    /// exceeds the size limit.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let path_str = path_ref.to_string_lossy().to_string();

        if !path_ref.exists() {
            return Err(IoError::FileNotFound { path: path_str }.into());
        }

        let read_failed = |e: std::io::Error| IoError::ReadFailed {
            path: path_str.clone(),
            reason: e.to_string(),
        };
        let file = File::open(path_ref).map_err(read_failed)?;
        let size = file.metadata().map_err(read_failed)?.len();

        if size > MAX_FILE_SIZE {
            return Err(IoError::ReadFailed {
                path: path_str,
                reason: format!("file too large: {size} bytes (max: {MAX_FILE_SIZE} bytes)"),
            }
            .into());
        }

        Ok(Self {
            file,
            size,
            path: path_str,
        })
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Reads the file as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or the content is not valid UTF-8.
    pub fn read_to_string(&self) -> Result<String> {
        if self.size >= MMAP_THRESHOLD {
            // Safety: the map is read-only and dropped before returning
            let mmap = unsafe {
                Mmap::map(&self.file).map_err(|e| IoError::MmapFailed {
                    path: self.path.clone(),
                    reason: e.to_string(),
                })?
            };
            self.decode(&mmap).map(str::to_string)
        } else {
            let mut bytes = Vec::new();
            (&self.file)
                .read_to_end(&mut bytes)
                .map_err(|e| IoError::ReadFailed {
                    path: self.path.clone(),
                    reason: e.to_string(),
                })?;
            String::from_utf8(bytes).map_err(|e| self.invalid_utf8(e.utf8_error().valid_up_to()))
        }
    }

    fn decode<'a>(&self, bytes: &'a [u8]) -> Result<&'a str> {
        crate::io::unicode::validate_utf8(bytes).map_err(|pos| self.invalid_utf8(pos))
    }

    fn invalid_utf8(&self, pos: usize) -> crate::error::Error {
        IoError::ReadFailed {
            path: self.path.clone(),
            reason: format!("invalid UTF-8 at byte {pos}"),
        }
        .into()
    }
}

/// Reads a text file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid UTF-8.
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<String> {
    FileReader::open(path)?.read_to_string()
}

/// Reads text from `path`, or from stdin when `path` is `None` or `-`.
///
/// # Errors
///
/// Returns an error if reading fails or the input is not valid UTF-8.
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) if p.as_os_str() != "-" => read_file(p),
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| IoError::ReadFailed {
                    path: "<stdin>".to_string(),
                    reason: e.to_string(),
                })?;
            Ok(text)
        }
    }
}

/// Writes text to a file, creating parent directories if needed.
///
/// # Errors
///
/// Returns an error if directory creation or writing fails.
pub fn write_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let path_ref = path.as_ref();
    let write_failed = |e: std::io::Error| IoError::WriteFailed {
        path: path_ref.to_string_lossy().to_string(),
        reason: e.to_string(),
    };

    if let Some(parent) = path_ref.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(write_failed)?;
    }

    std::fs::write(path_ref, content).map_err(write_failed)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_small_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("small.txt");
        std::fs::write(&file_path, "Hello {{name}}").unwrap();

        let reader = FileReader::open(&file_path).unwrap();
        assert_eq!(reader.size(), 14);
        assert!(reader.path().contains("small.txt"));
        assert_eq!(reader.read_to_string().unwrap(), "Hello {{name}}");
    }

    #[test]
    fn test_read_nonexistent_file() {
        let err = read_file("/nonexistent/path/file.txt").unwrap_err();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_read_large_file_mmap_path() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("large.txt");
        let large_content = "{{x}} ".repeat(300_000);
        std::fs::write(&file_path, &large_content).unwrap();

        let reader = FileReader::open(&file_path).unwrap();
        assert!(reader.size() >= MMAP_THRESHOLD);
        assert_eq!(reader.read_to_string().unwrap(), large_content);
    }

    #[test]
    fn test_read_invalid_utf8() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("invalid.bin");
        std::fs::write(&file_path, [b'a', 0xff, 0xfe]).unwrap();

        let err = read_file(&file_path).unwrap_err();
        assert!(err.to_string().contains("invalid UTF-8 at byte 1"));
    }

    #[test]
    fn test_read_invalid_utf8_via_mmap() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("large_invalid.bin");
        let mut content = vec![b'x'; 1024 * 1024 + 100];
        content[10] = 0xff;
        std::fs::write(&file_path, &content).unwrap();

        let err = read_file(&file_path).unwrap_err();
        assert!(err.to_string().contains("invalid UTF-8 at byte 10"));
    }

    #[test]
    fn test_read_input_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("in.txt");
        std::fs::write(&file_path, "text").unwrap();
        assert_eq!(read_input(Some(&file_path)).unwrap(), "text");
    }

    #[test]
    fn test_write_file_creates_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("a/b/out.txt");

        write_file(&file_path, "Bonjour <VAR:0123456789ab>").unwrap();
        assert_eq!(
            std::fs::read_to_string(&file_path).unwrap(),
            "Bonjour <VAR:0123456789ab>"
        );
    }
}
