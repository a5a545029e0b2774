//! Classification of a current scan against a stored baseline.
//!
//! Runs single-threaded over fully collected inputs. Both inputs iterate in
//! path order, so the report does not depend on the order in which hashing
//! results arrived.

use std::collections::{HashMap, VecDeque};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use tracing::info;

use fixity_core::{
    Baseline, ChangedFile, Checksum, CurrentScan, FailedFile, MatchedFile, MissingFile, NewFile,
    RelocatedFile, StatusReport,
};

/// What to do with a missing/new pair that shares a checksum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelocationPolicy {
    /// Emit a relocated entry for the pair.
    #[default]
    Report,
    /// Drop the pair from both sets without reporting it.
    Suppress,
}

/// Configuration for reconciliation.
#[derive(Debug, Clone, Default, Builder)]
#[builder(setter(into))]
pub struct ReconcileConfig {
    /// Handling of detected relocations.
    #[builder(default)]
    pub relocation: RelocationPolicy,
}

impl ReconcileConfig {
    /// Create a new config builder.
    pub fn builder() -> ReconcileConfigBuilder {
        ReconcileConfigBuilder::default()
    }
}

/// Baseline reconciler.
pub struct Reconciler {
    config: ReconcileConfig,
}

impl Reconciler {
    /// Create a reconciler that reports relocations.
    pub fn new() -> Self {
        Self {
            config: ReconcileConfig::default(),
        }
    }

    /// Create a reconciler with custom config.
    pub fn with_config(config: ReconcileConfig) -> Self {
        Self { config }
    }

    /// Classify every path of `baseline` and `current`.
    pub fn reconcile(&self, baseline: &Baseline, current: &CurrentScan) -> StatusReport {
        let mut report = StatusReport::default();
        let mut new = Vec::new();

        for (path, checksum) in current.iter() {
            match baseline.get(path) {
                Some(stored) if stored == checksum => report.matched.push(MatchedFile {
                    path: path.to_string(),
                    checksum: checksum.clone(),
                }),
                Some(stored) => report.changed.push(ChangedFile {
                    path: path.to_string(),
                    stored_checksum: stored.clone(),
                    current_checksum: checksum.clone(),
                }),
                None => new.push(NewFile {
                    path: path.to_string(),
                    current_checksum: checksum.clone(),
                }),
            }
        }

        let mut failed: Vec<FailedFile> = current
            .failures()
            .map(|(path, error)| FailedFile {
                path: path.to_string(),
                error: error.to_string(),
                stored_checksum: baseline.get(path).cloned(),
            })
            .collect();

        // A file that exists but could not be read is not missing, and neither
        // is one inside a directory the walk could not list.
        let mut missing = Vec::new();
        for record in baseline {
            if current.contains(&record.path) || current.is_failed(&record.path) {
                continue;
            }
            match current.unreadable_dir_of(&record.path) {
                Some(error) => failed.push(FailedFile {
                    path: record.path.clone(),
                    error: error.to_string(),
                    stored_checksum: Some(record.checksum.clone()),
                }),
                None => missing.push(MissingFile {
                    path: record.path.clone(),
                    checksum: record.checksum.clone(),
                }),
            }
        }
        failed.sort_by(|a, b| a.path.cmp(&b.path));
        report.failed = failed;

        let (new, missing, relocated) = pair_relocations(new, missing);
        report.new = new;
        report.missing = missing;
        if self.config.relocation == RelocationPolicy::Report {
            report.relocated = relocated;
        }

        info!(
            matched = report.matched.len(),
            changed = report.changed.len(),
            new = report.new.len(),
            missing = report.missing.len(),
            relocated = report.relocated.len(),
            failed = report.failed.len(),
            "Reconciliation finished"
        );

        report
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

/// Fold missing/new pairs with equal checksums into relocations.
///
/// Both inputs must be sorted by path. Missing entries are visited in path
/// order and each claims the lexicographically smallest unclaimed new path
/// with its checksum.
fn pair_relocations(
    new: Vec<NewFile>,
    missing: Vec<MissingFile>,
) -> (Vec<NewFile>, Vec<MissingFile>, Vec<RelocatedFile>) {
    let mut by_checksum: HashMap<&Checksum, VecDeque<usize>> = HashMap::new();
    for (index, file) in new.iter().enumerate() {
        by_checksum
            .entry(&file.current_checksum)
            .or_default()
            .push_back(index);
    }

    let mut claimed = vec![false; new.len()];
    let mut relocated = Vec::new();
    let mut still_missing = Vec::new();

    for file in missing {
        match by_checksum
            .get_mut(&file.checksum)
            .and_then(|candidates| candidates.pop_front())
        {
            Some(index) => {
                claimed[index] = true;
                relocated.push(RelocatedFile {
                    from: file.path,
                    to: new[index].path.clone(),
                    checksum: file.checksum,
                });
            }
            None => still_missing.push(file),
        }
    }

    let still_new = new
        .into_iter()
        .zip(claimed)
        .filter_map(|(file, claimed)| (!claimed).then_some(file))
        .collect();

    (still_new, still_missing, relocated)
}
