//! File records, baselines and the transient current scan.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BaselineError, ScanWarning, WarningKind};

/// Lowercase hex encoding of a file's content digest.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checksum(String);

impl Checksum {
    /// Wrap an already hex-encoded digest.
    ///
    /// No validation happens here; the baseline store checks loaded
    /// checksums against the digest algorithm in use.
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// Encode raw digest bytes as lowercase hex.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Get the hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check that this is lowercase hex of exactly `hex_len` characters.
    pub fn is_well_formed(&self, hex_len: usize) -> bool {
        self.0.len() == hex_len
            && self
                .0
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Checksum {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Checksum {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A file path paired with its content checksum.
///
/// The path is relative to the scan root and always uses `/` separators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Relative, POSIX-normalized path.
    #[serde(rename = "file_path")]
    pub path: String,
    /// Content checksum.
    pub checksum: Checksum,
}

impl FileRecord {
    /// Create a new file record.
    pub fn new(path: impl Into<String>, checksum: impl Into<Checksum>) -> Self {
        Self {
            path: path.into(),
            checksum: checksum.into(),
        }
    }
}

/// A file that could not be hashed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashFailure {
    /// Relative path of the file.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl HashFailure {
    /// Create a new hash failure.
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result of hashing a single file.
pub type HashOutcome = Result<FileRecord, HashFailure>;

/// The stored ground truth: records unique by path, sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Baseline {
    records: Vec<FileRecord>,
}

impl Baseline {
    /// Create an empty baseline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a baseline, rejecting duplicate paths.
    pub fn from_records(
        records: impl IntoIterator<Item = FileRecord>,
    ) -> Result<Self, BaselineError> {
        let mut records: Vec<FileRecord> = records.into_iter().collect();
        records.sort_by(|a, b| a.path.cmp(&b.path));

        if let Some(pair) = records.windows(2).find(|w| w[0].path == w[1].path) {
            return Err(BaselineError::DuplicatePath {
                path: pair[0].path.clone(),
            });
        }

        Ok(Self { records })
    }

    /// Look up the stored checksum for a path.
    pub fn get(&self, path: &str) -> Option<&Checksum> {
        self.records
            .binary_search_by(|r| r.path.as_str().cmp(path))
            .ok()
            .map(|i| &self.records[i].checksum)
    }

    /// Check whether the baseline has a record for a path.
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Records in path order.
    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    /// Iterate over records in path order.
    pub fn iter(&self) -> std::slice::Iter<'_, FileRecord> {
        self.records.iter()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the baseline has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consume the baseline, returning its records.
    pub fn into_records(self) -> Vec<FileRecord> {
        self.records
    }
}

impl<'a> IntoIterator for &'a Baseline {
    type Item = &'a FileRecord;
    type IntoIter = std::slice::Iter<'a, FileRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Path to checksum mapping produced by one scan, plus the files and
/// directories that could not be read.
///
/// Backed by ordered maps so that anything derived from it is independent of
/// the order in which hashing results arrived.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentScan {
    digests: BTreeMap<String, Checksum>,
    failures: BTreeMap<String, String>,
    unreadable_dirs: BTreeMap<String, String>,
}

impl CurrentScan {
    /// Create an empty scan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reduce hashing outcomes into a scan.
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = HashOutcome>) -> Self {
        let mut scan = Self::new();
        for outcome in outcomes {
            match outcome {
                Ok(record) => {
                    scan.insert(record.path, record.checksum);
                }
                Err(failure) => scan.record_failure(failure.path, failure.message),
            }
        }
        scan
    }

    /// Record the checksum of a path, clearing any failure for it.
    pub fn insert(
        &mut self,
        path: impl Into<String>,
        checksum: impl Into<Checksum>,
    ) -> Option<Checksum> {
        let path = path.into();
        self.failures.remove(&path);
        self.digests.insert(path, checksum.into())
    }

    /// Record that a path could not be hashed, clearing any checksum for it.
    pub fn record_failure(&mut self, path: impl Into<String>, message: impl Into<String>) {
        let path = path.into();
        self.digests.remove(&path);
        self.failures.insert(path, message.into());
    }

    /// Get the checksum of a path.
    pub fn get(&self, path: &str) -> Option<&Checksum> {
        self.digests.get(path)
    }

    /// Check whether a path was hashed successfully.
    pub fn contains(&self, path: &str) -> bool {
        self.digests.contains_key(path)
    }

    /// Check whether a path was seen but failed to hash.
    pub fn is_failed(&self, path: &str) -> bool {
        self.failures.contains_key(path)
    }

    /// Iterate over hashed paths in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Checksum)> {
        self.digests.iter().map(|(p, c)| (p.as_str(), c))
    }

    /// Iterate over failed paths and their error messages in path order.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.failures.iter().map(|(p, m)| (p.as_str(), m.as_str()))
    }

    /// Record a directory whose contents could not be listed.
    ///
    /// `dir` is root-relative; the empty string stands for the root itself.
    pub fn record_unreadable_dir(&mut self, dir: impl Into<String>, message: impl Into<String>) {
        self.unreadable_dirs.insert(dir.into(), message.into());
    }

    /// Record every unreadable location reported by the walk.
    pub fn record_walk_warnings(&mut self, warnings: &[ScanWarning]) {
        for warning in warnings {
            if warning.kind != WarningKind::ReadError {
                continue;
            }
            if let Some(relative) = &warning.relative {
                self.record_unreadable_dir(relative.clone(), warning.message.clone());
            }
        }
    }

    /// Error message of the unreadable directory containing `path`, if any.
    pub fn unreadable_dir_of(&self, path: &str) -> Option<&str> {
        self.unreadable_dirs
            .iter()
            .find(|(dir, _)| {
                dir.is_empty()
                    || path
                        .strip_prefix(dir.as_str())
                        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
            })
            .map(|(_, message)| message.as_str())
    }

    /// Iterate over unreadable directories and their error messages.
    pub fn unreadable_dirs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.unreadable_dirs
            .iter()
            .map(|(d, m)| (d.as_str(), m.as_str()))
    }

    /// Number of hashed paths.
    pub fn len(&self) -> usize {
        self.digests.len()
    }

    /// Check if no path was hashed.
    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }

    /// Number of failed paths.
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Turn the successful part of the scan into a baseline.
    pub fn to_baseline(&self) -> Baseline {
        // Map keys are unique and already sorted.
        Baseline {
            records: self
                .digests
                .iter()
                .map(|(path, checksum)| FileRecord::new(path.clone(), checksum.clone()))
                .collect(),
        }
    }
}

impl<P, C> FromIterator<(P, C)> for CurrentScan
where
    P: Into<String>,
    C: Into<Checksum>,
{
    fn from_iter<T: IntoIterator<Item = (P, C)>>(iter: T) -> Self {
        let mut scan = Self::new();
        for (path, checksum) in iter {
            scan.insert(path, checksum);
        }
        scan
    }
}
