//! Loading and saving the baseline file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use fixity_core::{Baseline, BaselineError, DEFAULT_BASELINE_FILE, DigestAlgorithm, FileRecord};

use crate::error::StoreError;
use crate::write_json_atomic;

/// Parse baseline JSON, checking every checksum against `algorithm`.
pub fn parse_baseline(json: &str, algorithm: DigestAlgorithm) -> Result<Baseline, BaselineError> {
    let records: Vec<FileRecord> =
        serde_json::from_str(json).map_err(|e| BaselineError::Parse {
            message: e.to_string(),
        })?;

    let expected_len = algorithm.hex_len();
    if let Some(bad) = records
        .iter()
        .find(|r| !r.checksum.is_well_formed(expected_len))
    {
        return Err(BaselineError::InvalidChecksum {
            path: bad.path.clone(),
            expected_len,
        });
    }

    Baseline::from_records(records)
}

/// Baseline file on disk.
#[derive(Debug, Clone)]
pub struct BaselineStore {
    path: PathBuf,
}

impl BaselineStore {
    /// Store backed by an explicit file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store using the default file name inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(DEFAULT_BASELINE_FILE))
    }

    /// Path of the baseline file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check whether a baseline has been written.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load and validate the baseline.
    pub fn load(&self, algorithm: DigestAlgorithm) -> Result<Baseline, StoreError> {
        let json = fs::read_to_string(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        let baseline =
            parse_baseline(&json, algorithm).map_err(|e| StoreError::malformed(&self.path, e))?;
        debug!(path = %self.path.display(), records = baseline.len(), "Baseline loaded");
        Ok(baseline)
    }

    /// Replace the baseline file.
    pub fn save(&self, baseline: &Baseline) -> Result<(), StoreError> {
        write_json_atomic(&self.path, baseline)?;
        info!(path = %self.path.display(), records = baseline.len(), "Baseline written");
        Ok(())
    }
}
