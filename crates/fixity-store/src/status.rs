//! Writing the status report file.

use std::path::{Path, PathBuf};

use tracing::info;

use fixity_core::{DEFAULT_STATUS_FILE, StatusReport};

use crate::error::StoreError;
use crate::write_json_atomic;

/// Status report file on disk.
#[derive(Debug, Clone)]
pub struct StatusStore {
    path: PathBuf,
}

impl StatusStore {
    /// Store backed by an explicit file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store using the default file name inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(DEFAULT_STATUS_FILE))
    }

    /// Path of the status file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the status file with `report`.
    pub fn save(&self, report: &StatusReport) -> Result<(), StoreError> {
        write_json_atomic(&self.path, report)?;
        info!(path = %self.path.display(), "Status report written");
        Ok(())
    }
}
