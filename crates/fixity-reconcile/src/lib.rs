//! Baseline reconciliation for fixity.
//!
//! Classifies a fresh [`CurrentScan`] against a stored [`Baseline`]:
//!
//! 1. Paths present in both are **matched** or **changed**
//! 2. Paths only in the scan are **new**, paths only in the baseline are
//!    **missing** (or **failed** if they exist but could not be read)
//! 3. Missing/new pairs sharing a checksum are folded into **relocated**
//!    entries, matched in lexicographic path order
//!
//! ```rust
//! use fixity_reconcile::{Baseline, CurrentScan, FileRecord, Reconciler};
//!
//! let baseline = Baseline::from_records(vec![
//!     FileRecord::new("x.txt", "aaa"),
//!     FileRecord::new("y.txt", "bbb"),
//! ])
//! .unwrap();
//! let current: CurrentScan = [("x.txt", "aaa"), ("z.txt", "bbb")].into_iter().collect();
//!
//! let report = Reconciler::new().reconcile(&baseline, &current);
//!
//! assert_eq!(report.matched.len(), 1);
//! assert!(report.new.is_empty() && report.missing.is_empty());
//! assert_eq!(report.relocated[0].to, "z.txt");
//! ```

mod engine;

pub use engine::{ReconcileConfig, ReconcileConfigBuilder, Reconciler, RelocationPolicy};

// Re-export core types
pub use fixity_core::{
    Baseline, ChangedFile, Checksum, Classification, CurrentScan, FailedFile, FileRecord,
    MatchedFile, MissingFile, NewFile, RelocatedFile, StatusReport,
};
