//! Parallel hashing coordinator.
//!
//! Files are fanned out over a dedicated rayon pool. Each worker hashes its
//! file independently and sends an immutable outcome over a channel; nothing
//! else is shared between workers apart from relaxed progress counters and
//! the cancel flag. Outcomes arrive in completion order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};

use rayon::prelude::*;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use fixity_core::{
    DigestAlgorithm, FileRecord, HashError, HashFailure, HashOutcome, ScanConfig, ScanError,
};

use crate::digest::{ChunkPolicy, DigestComputer};
use crate::filter::CandidateFile;
use crate::progress::{HashProgress, ProgressTracker};

/// A progress snapshot is broadcast every this many finished files.
pub const PROGRESS_INTERVAL: u64 = 256;

/// Hashes batches of files on a bounded worker pool.
pub struct HashCoordinator {
    computer: DigestComputer,
    threads: usize,
    cancel: Arc<AtomicBool>,
    progress_tx: broadcast::Sender<HashProgress>,
}

impl HashCoordinator {
    /// Create a coordinator using all available cores.
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self {
            computer: DigestComputer::new(algorithm),
            threads: 0,
            cancel: Arc::new(AtomicBool::new(false)),
            progress_tx,
        }
    }

    /// Create a coordinator from the algorithm and thread count of a scan config.
    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(config.algorithm).with_threads(config.threads)
    }

    /// Set the worker count (0 = available parallelism).
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Override the read chunk policy.
    pub fn with_chunk_policy(mut self, policy: ChunkPolicy) -> Self {
        self.computer = DigestComputer::with_policy(self.computer.algorithm(), policy);
        self
    }

    /// Digest algorithm in use.
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.computer.algorithm()
    }

    /// Subscribe to hashing progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<HashProgress> {
        self.progress_tx.subscribe()
    }

    /// Flag that stops the current and future batches when set.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Hash every file, isolating per-file failures.
    ///
    /// Returns [`ScanError::Interrupted`] if cancelled; outcomes gathered up to
    /// that point are dropped.
    pub fn hash_all<I>(&self, files: I) -> Result<Vec<HashOutcome>, ScanError>
    where
        I: IntoIterator<Item = CandidateFile>,
    {
        let files: Vec<CandidateFile> = files.into_iter().collect();
        let tracker = ProgressTracker::new(files.len() as u64);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .thread_name(|i| format!("fixity-hash-{i}"))
            .build()
            .map_err(|e| ScanError::invalid_config(format!("Failed to start worker pool: {e}")))?;

        let (tx, rx) = mpsc::channel();
        pool.install(|| {
            files.into_par_iter().for_each_with(tx, |tx, file| {
                if self.cancel.load(Ordering::Relaxed) {
                    return;
                }
                let outcome = self.hash_one(file, &tracker);
                // The receiver outlives the pool, so sending cannot fail.
                let _ = tx.send(outcome);
            });
        });

        if self.cancel.load(Ordering::Relaxed) {
            warn!("Hashing interrupted, discarding partial results");
            return Err(ScanError::Interrupted);
        }

        let outcomes: Vec<HashOutcome> = rx.into_iter().collect();
        let summary = tracker.snapshot(None);
        info!(
            hashed = summary.files_hashed,
            failed = summary.files_failed,
            bytes = summary.bytes_hashed,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Hashing finished"
        );
        let _ = self.progress_tx.send(summary);

        Ok(outcomes)
    }

    fn hash_one(&self, file: CandidateFile, tracker: &ProgressTracker) -> HashOutcome {
        debug!(path = %file.relative, "Computing hash");

        let (outcome, done) = match self.computer.compute(&file.path) {
            Ok(digested) => {
                let done = tracker.record_success(digested.bytes);
                (Ok(FileRecord::new(file.relative, digested.checksum)), done)
            }
            Err(HashError::Io { source, .. }) => {
                debug!(path = %file.relative, "Failed to hash: {source}");
                let done = tracker.record_failure();
                (Err(HashFailure::new(file.relative, source.to_string())), done)
            }
        };

        if done % PROGRESS_INTERVAL == 0 {
            let _ = self.progress_tx.send(tracker.snapshot(Some(file.path)));
        }

        outcome
    }
}
