//! Error types for scanning, hashing and baseline handling.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal errors that stop a scan before or during hashing.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Operation was interrupted.
    #[error("Operation interrupted")]
    Interrupted,

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Failure to hash a single file. Never fatal for a batch.
#[derive(Debug, Error)]
pub enum HashError {
    /// The file could not be opened, stat'ed or fully read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// The persisted baseline is not well-formed.
#[derive(Debug, Error)]
pub enum BaselineError {
    /// The document could not be parsed.
    #[error("Baseline could not be parsed: {message}")]
    Parse { message: String },

    /// Two records share the same path.
    #[error("Duplicate path in baseline: {path}")]
    DuplicatePath { path: String },

    /// A checksum does not match the configured digest algorithm.
    #[error("Invalid checksum for {path}: expected {expected_len} lowercase hex characters")]
    InvalidChecksum { path: String, expected_len: usize },
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Error reading a directory entry.
    ReadError,
    /// Path is not valid UTF-8 and cannot be stored in a baseline.
    NonUtf8Path,
}

/// Non-fatal warning encountered while walking the tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
    /// Path relative to the scan root, when it has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative: Option<String>,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
            relative: None,
        }
    }

    /// Attach the root-relative key of the path.
    pub fn with_relative(mut self, relative: impl Into<String>) -> Self {
        self.relative = Some(relative.into());
        self
    }

    /// Create a non-UTF-8 path warning.
    pub fn non_utf8(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Skipping non-UTF-8 path: {}", path.display()),
            path,
            kind: WarningKind::NonUtf8Path,
            relative: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_io() {
        let err = ScanError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, ScanError::PermissionDenied { .. }));

        let err = ScanError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, ScanError::NotFound { .. }));
    }

    #[test]
    fn test_hash_error_message_names_path() {
        let err = HashError::io(
            "/data/a.bin",
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read"),
        );
        let message = err.to_string();
        assert!(message.contains("/data/a.bin"));
        assert!(message.contains("short read"));
    }

    #[test]
    fn test_non_utf8_warning() {
        let warning = ScanWarning::non_utf8("/test/bad");
        assert_eq!(warning.kind, WarningKind::NonUtf8Path);
        assert!(warning.message.contains("non-UTF-8"));
    }
}
