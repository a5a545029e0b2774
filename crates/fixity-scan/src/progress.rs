//! Hashing progress reporting.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Progress information during a hashing batch.
#[derive(Debug, Clone)]
pub struct HashProgress {
    /// Files hashed successfully so far.
    pub files_hashed: u64,
    /// Files that failed to hash so far.
    pub files_failed: u64,
    /// Total files in the batch.
    pub total_files: u64,
    /// Bytes hashed so far.
    pub bytes_hashed: u64,
    /// Most recently finished file, if any.
    pub current_path: Option<PathBuf>,
    /// Time elapsed since the batch started.
    pub elapsed: Duration,
}

impl HashProgress {
    /// Create initial progress state.
    pub fn new(total_files: u64) -> Self {
        Self {
            files_hashed: 0,
            files_failed: 0,
            total_files,
            bytes_hashed: 0,
            current_path: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Files finished, successfully or not.
    pub fn files_done(&self) -> u64 {
        self.files_hashed + self.files_failed
    }

    /// Fraction of the batch finished, in `0.0..=1.0`.
    pub fn fraction_done(&self) -> f64 {
        if self.total_files == 0 {
            1.0
        } else {
            self.files_done() as f64 / self.total_files as f64
        }
    }

    /// Calculate hashing rate in bytes per second.
    pub fn bytes_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.bytes_hashed as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

impl Default for HashProgress {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Counters shared by all workers of one batch.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    start_time: Instant,
    total_files: u64,
    files_hashed: AtomicU64,
    files_failed: AtomicU64,
    bytes_hashed: AtomicU64,
}

impl ProgressTracker {
    pub fn new(total_files: u64) -> Self {
        Self {
            start_time: Instant::now(),
            total_files,
            files_hashed: AtomicU64::new(0),
            files_failed: AtomicU64::new(0),
            bytes_hashed: AtomicU64::new(0),
        }
    }

    /// Record a hashed file, returning the number of files finished so far.
    pub fn record_success(&self, bytes: u64) -> u64 {
        self.bytes_hashed.fetch_add(bytes, Ordering::Relaxed);
        let hashed = self.files_hashed.fetch_add(1, Ordering::Relaxed) + 1;
        hashed + self.files_failed.load(Ordering::Relaxed)
    }

    /// Record a failed file, returning the number of files finished so far.
    pub fn record_failure(&self) -> u64 {
        let failed = self.files_failed.fetch_add(1, Ordering::Relaxed) + 1;
        failed + self.files_hashed.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self, current_path: Option<PathBuf>) -> HashProgress {
        HashProgress {
            files_hashed: self.files_hashed.load(Ordering::Relaxed),
            files_failed: self.files_failed.load(Ordering::Relaxed),
            total_files: self.total_files,
            bytes_hashed: self.bytes_hashed.load(Ordering::Relaxed),
            current_path,
            elapsed: self.start_time.elapsed(),
        }
    }
}
