//! Baseline and status report persistence for fixity.
//!
//! The baseline is a JSON array of `{ "file_path", "checksum" }` records; the
//! status report is a JSON object with `changed`, `new`, `missing`,
//! `relocated` and `failed` arrays. Both files are written in one piece
//! through a temporary file that is renamed into place.

mod baseline;
mod error;
mod status;

use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tempfile::NamedTempFile;

pub use baseline::{BaselineStore, parse_baseline};
pub use error::StoreError;
pub use status::StatusStore;

/// Serialize `value` as pretty JSON and atomically replace `path` with it.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(path, e))?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, value)
            .map_err(|e| StoreError::serialize(path, e))?;
        writer.flush().map_err(|e| StoreError::io(path, e))?;
    }
    tmp.persist(path).map_err(|e| StoreError::io(path, e.error))?;
    Ok(())
}
