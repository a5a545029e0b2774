//! Persistence errors.

use std::path::PathBuf;

use fixity_core::BaselineError;
use thiserror::Error;

/// Errors raised while reading or writing baseline and report files.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The file could not be read or written.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The baseline file exists but is not a valid baseline.
    #[error("Malformed baseline {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: BaselineError,
    },

    /// The value could not be encoded as JSON.
    #[error("Failed to encode {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a malformed baseline error with path context.
    pub fn malformed(path: impl Into<PathBuf>, source: BaselineError) -> Self {
        Self::Malformed {
            path: path.into(),
            source,
        }
    }

    /// Create an encoding error with path context.
    pub fn serialize(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Serialize {
            path: path.into(),
            source,
        }
    }

    /// Check if this error means the baseline content is unusable.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}
