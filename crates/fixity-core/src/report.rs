//! Classification results and the status report.

use serde::{Deserialize, Serialize};

use crate::record::Checksum;

/// File whose checksum matches the baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedFile {
    #[serde(rename = "file")]
    pub path: String,
    pub checksum: Checksum,
}

/// File whose checksum differs from the baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    #[serde(rename = "file")]
    pub path: String,
    pub stored_checksum: Checksum,
    pub current_checksum: Checksum,
}

/// File absent from the baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFile {
    #[serde(rename = "file")]
    pub path: String,
    pub current_checksum: Checksum,
}

/// Baseline file absent from the current tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingFile {
    #[serde(rename = "file")]
    pub path: String,
    pub checksum: Checksum,
}

/// Baseline file that reappeared, unchanged, under another path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocatedFile {
    pub from: String,
    pub to: String,
    pub checksum: Checksum,
}

/// File that exists but could not be hashed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedFile {
    #[serde(rename = "file")]
    pub path: String,
    pub error: String,
    /// Checksum recorded in the baseline, if the file was known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_checksum: Option<Checksum>,
}

/// One classified file, as a single enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Matched(MatchedFile),
    Changed(ChangedFile),
    New(NewFile),
    Missing(MissingFile),
    Relocated(RelocatedFile),
    Failed(FailedFile),
}

impl Classification {
    /// Short lowercase label for the kind.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Matched(_) => "matched",
            Self::Changed(_) => "changed",
            Self::New(_) => "new",
            Self::Missing(_) => "missing",
            Self::Relocated(_) => "relocated",
            Self::Failed(_) => "failed",
        }
    }

    /// Every path this classification accounts for.
    pub fn paths(&self) -> Vec<&str> {
        match self {
            Self::Matched(f) => vec![f.path.as_str()],
            Self::Changed(f) => vec![f.path.as_str()],
            Self::New(f) => vec![f.path.as_str()],
            Self::Missing(f) => vec![f.path.as_str()],
            Self::Relocated(f) => vec![f.from.as_str(), f.to.as_str()],
            Self::Failed(f) => vec![f.path.as_str()],
        }
    }
}

/// Outcome of reconciling a scan against a baseline.
///
/// Every bucket is sorted by path. Matched files are kept in memory but not
/// written to the status report file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    #[serde(skip)]
    pub matched: Vec<MatchedFile>,
    #[serde(default)]
    pub changed: Vec<ChangedFile>,
    #[serde(default)]
    pub new: Vec<NewFile>,
    #[serde(default)]
    pub missing: Vec<MissingFile>,
    #[serde(default)]
    pub relocated: Vec<RelocatedFile>,
    #[serde(default)]
    pub failed: Vec<FailedFile>,
}

impl StatusReport {
    /// Check if anything differs from the baseline.
    pub fn has_differences(&self) -> bool {
        !(self.changed.is_empty()
            && self.new.is_empty()
            && self.missing.is_empty()
            && self.relocated.is_empty())
    }

    /// Check if any file could not be hashed.
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Check if the tree matches the baseline exactly.
    pub fn is_clean(&self) -> bool {
        !self.has_differences() && !self.has_failures()
    }

    /// Number of classification entries across all buckets.
    pub fn entry_count(&self) -> usize {
        self.matched.len()
            + self.changed.len()
            + self.new.len()
            + self.missing.len()
            + self.relocated.len()
            + self.failed.len()
    }

    /// Flatten all buckets into one list, bucket by bucket.
    pub fn classifications(&self) -> Vec<Classification> {
        let mut all = Vec::with_capacity(self.entry_count());
        all.extend(self.matched.iter().cloned().map(Classification::Matched));
        all.extend(self.changed.iter().cloned().map(Classification::Changed));
        all.extend(self.new.iter().cloned().map(Classification::New));
        all.extend(self.missing.iter().cloned().map(Classification::Missing));
        all.extend(self.relocated.iter().cloned().map(Classification::Relocated));
        all.extend(self.failed.iter().cloned().map(Classification::Failed));
        all
    }
}
