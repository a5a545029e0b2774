//! Core types and errors for fixity.
//!
//! This crate provides the data structures shared by the scanning, storage
//! and reconciliation crates: file records, baselines, the transient current
//! scan, classification results and configuration.

mod config;
mod error;
mod record;
mod report;

pub use config::{
    DEFAULT_BASELINE_FILE, DEFAULT_STATUS_FILE, DigestAlgorithm, ScanConfig, ScanConfigBuilder,
};
pub use error::{BaselineError, HashError, ScanError, ScanWarning, WarningKind};
pub use record::{Baseline, Checksum, CurrentScan, FileRecord, HashFailure, HashOutcome};
pub use report::{
    ChangedFile, Classification, FailedFile, MatchedFile, MissingFile, NewFile, RelocatedFile,
    StatusReport,
};
