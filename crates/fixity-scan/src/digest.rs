//! Streaming file digests with adaptive read sizes.
//!
//! The read chunk size is picked from the file size before reading. It only
//! tunes I/O throughput: both hashers are incremental, so the digest never
//! depends on how the content was split.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use blake2::{Blake2b512, Digest};

use fixity_core::{Checksum, DigestAlgorithm, HashError};

const KIB: usize = 1024;
const MIB: u64 = 1024 * 1024;

/// File-size thresholds and the read chunk size used for each band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPolicy {
    /// Files strictly larger than this use `large_chunk`.
    pub large_threshold: u64,
    /// Chunk size for large files.
    pub large_chunk: usize,
    /// Files strictly larger than this (and not large) use `medium_chunk`.
    pub medium_threshold: u64,
    /// Chunk size for medium files.
    pub medium_chunk: usize,
    /// Chunk size for everything else.
    pub default_chunk: usize,
}

impl ChunkPolicy {
    /// Pick the read chunk size for a file of `size` bytes.
    pub fn chunk_size_for(&self, size: u64) -> usize {
        let chunk = if size > self.large_threshold {
            self.large_chunk
        } else if size > self.medium_threshold {
            self.medium_chunk
        } else {
            self.default_chunk
        };
        chunk.max(1)
    }
}

impl Default for ChunkPolicy {
    fn default() -> Self {
        Self {
            large_threshold: 16 * MIB,
            large_chunk: 1024 * KIB,
            medium_threshold: MIB,
            medium_chunk: 64 * KIB,
            default_chunk: 16 * KIB,
        }
    }
}

/// Checksum of one file plus the number of bytes read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digested {
    pub checksum: Checksum,
    pub bytes: u64,
}

enum StreamHasher {
    Blake3(Box<blake3::Hasher>),
    Blake2b(Box<Blake2b512>),
}

impl StreamHasher {
    fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
            DigestAlgorithm::Blake2b => Self::Blake2b(Box::new(Blake2b512::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Blake3(hasher) => {
                hasher.update(data);
            }
            Self::Blake2b(hasher) => hasher.update(data),
        }
    }

    fn finalize(self) -> Checksum {
        match self {
            Self::Blake3(hasher) => Checksum::from_bytes(hasher.finalize().as_bytes()),
            Self::Blake2b(hasher) => Checksum::from_bytes(&Digest::finalize(*hasher)),
        }
    }
}

/// Computes file checksums. Stateless; cheap to copy into workers.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestComputer {
    algorithm: DigestAlgorithm,
    policy: ChunkPolicy,
}

impl DigestComputer {
    /// Create a computer with the default chunk policy.
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        Self {
            algorithm,
            policy: ChunkPolicy::default(),
        }
    }

    /// Create a computer with a custom chunk policy.
    pub fn with_policy(algorithm: DigestAlgorithm, policy: ChunkPolicy) -> Self {
        Self { algorithm, policy }
    }

    /// Digest algorithm in use.
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Chunk policy in use.
    pub fn policy(&self) -> ChunkPolicy {
        self.policy
    }

    /// Stream a file through the hasher.
    pub fn compute(&self, path: &Path) -> Result<Digested, HashError> {
        let mut file = File::open(path).map_err(|e| HashError::io(path, e))?;
        let size = file.metadata().map_err(|e| HashError::io(path, e))?.len();

        let mut buffer = vec![0u8; self.policy.chunk_size_for(size)];
        let mut hasher = StreamHasher::new(self.algorithm);
        let mut bytes: u64 = 0;

        loop {
            let read = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::io(path, e)),
            };
            hasher.update(&buffer[..read]);
            bytes += read as u64;
        }

        Ok(Digested {
            checksum: hasher.finalize(),
            bytes,
        })
    }
}

/// Compute the checksum of a file with the default chunk policy.
pub fn compute_digest(path: &Path, algorithm: DigestAlgorithm) -> Result<Checksum, HashError> {
    DigestComputer::new(algorithm)
        .compute(path)
        .map(|d| d.checksum)
}
