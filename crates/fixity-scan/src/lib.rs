//! Tree walking and parallel content hashing for fixity.
//!
//! This crate turns a directory tree into a path to checksum mapping:
//!
//! - **Path filtering** via jwalk, skipping excluded directory and file names
//! - **Adaptive chunked hashing** with BLAKE3 or BLAKE2b
//! - **Parallel hashing** on a bounded rayon pool, with per-file failures
//!   isolated from the rest of the batch
//! - **Progress updates** via broadcast channels
//!
//! # Example
//!
//! ```rust,no_run
//! use fixity_scan::{CurrentScan, HashCoordinator, PathFilter, ScanConfig};
//!
//! let config = ScanConfig::new("/path/to/tree");
//! let filter = PathFilter::new(&config).unwrap();
//! let (files, _warnings) = filter.collect();
//!
//! let coordinator = HashCoordinator::from_config(&config);
//! let outcomes = coordinator.hash_all(files).unwrap();
//! let scan = CurrentScan::from_outcomes(outcomes);
//!
//! println!("Hashed {} files", scan.len());
//! ```

mod coordinator;
mod digest;
mod filter;
mod progress;

pub use coordinator::{HashCoordinator, PROGRESS_INTERVAL};
pub use digest::{ChunkPolicy, DigestComputer, Digested, compute_digest};
pub use filter::{CandidateFile, FileWalk, PathFilter};
pub use progress::HashProgress;

// Re-export core types for convenience
pub use fixity_core::{
    Checksum, CurrentScan, DigestAlgorithm, FileRecord, HashError, HashFailure, HashOutcome,
    ScanConfig, ScanError, ScanWarning, WarningKind,
};
