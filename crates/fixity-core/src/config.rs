//! Scan configuration types.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Default file name of the persisted baseline.
pub const DEFAULT_BASELINE_FILE: &str = "all-checksums.json";

/// Default file name of the status report.
pub const DEFAULT_STATUS_FILE: &str = "status-checksums.json";

/// Digest algorithm used to checksum file contents.
///
/// A baseline must be verified with the algorithm that produced it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// BLAKE3, 256-bit output.
    #[default]
    Blake3,
    /// BLAKE2b, 512-bit output.
    Blake2b,
}

impl DigestAlgorithm {
    /// Digest length in bytes.
    pub fn digest_len(self) -> usize {
        match self {
            Self::Blake3 => 32,
            Self::Blake2b => 64,
        }
    }

    /// Length of the hex-encoded digest.
    pub fn hex_len(self) -> usize {
        self.digest_len() * 2
    }

    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Blake3 => "blake3",
            Self::Blake2b => "blake2b",
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "blake3" => Ok(Self::Blake3),
            "blake2b" | "blake2b512" => Ok(Self::Blake2b),
            other => Err(format!("Unknown digest algorithm: {other}")),
        }
    }
}

/// Configuration for scanning a tree.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Root directory to scan.
    pub root: PathBuf,

    /// Directory names skipped wherever they appear.
    #[builder(default = "default_excluded_dirs()")]
    #[serde(default = "default_excluded_dirs")]
    pub excluded_dirs: Vec<String>,

    /// File names skipped wherever they appear.
    #[builder(default = "default_excluded_files()")]
    #[serde(default = "default_excluded_files")]
    pub excluded_files: Vec<String>,

    /// Glob patterns matched against relative paths.
    #[builder(default)]
    #[serde(default)]
    pub exclude_globs: Vec<String>,

    /// Number of hashing threads (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Digest algorithm.
    #[builder(default)]
    #[serde(default)]
    pub algorithm: DigestAlgorithm,
}

fn default_excluded_dirs() -> Vec<String> {
    vec!["$RECYCLE.BIN".to_string(), ".git".to_string()]
}

fn default_excluded_files() -> Vec<String> {
    vec![
        DEFAULT_BASELINE_FILE.to_string(),
        DEFAULT_STATUS_FILE.to_string(),
    ]
}

/// Check a list of exclusion names, returning a description of the first problem.
fn check_names(kind: &str, names: &[String]) -> Result<(), String> {
    for name in names {
        if name.trim().is_empty() {
            return Err(format!("Excluded {kind} name cannot be empty"));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(format!(
                "Excluded {kind} name must not contain a path separator: {name}"
            ));
        }
    }
    Ok(())
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        if let Some(ref dirs) = self.excluded_dirs {
            check_names("directory", dirs)?;
        }
        if let Some(ref files) = self.excluded_files {
            check_names("file", files)?;
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a default config for scanning a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            excluded_dirs: default_excluded_dirs(),
            excluded_files: default_excluded_files(),
            exclude_globs: Vec::new(),
            threads: 0,
            algorithm: DigestAlgorithm::default(),
        }
    }

    /// Re-check a config that may have been built without the builder.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.root.as_os_str().is_empty() {
            return Err(ScanError::invalid_config("Root path cannot be empty"));
        }
        check_names("directory", &self.excluded_dirs).map_err(ScanError::invalid_config)?;
        check_names("file", &self.excluded_files).map_err(ScanError::invalid_config)?;
        Ok(())
    }

    /// Check if a directory with this name is skipped.
    pub fn is_excluded_dir(&self, name: &str) -> bool {
        self.excluded_dirs.iter().any(|d| d == name)
    }

    /// Check if a file with this name is skipped.
    pub fn is_excluded_file(&self, name: &str) -> bool {
        self.excluded_files.iter().any(|f| f == name)
    }

    /// Add a file name to the exclusions if not already present.
    pub fn exclude_file(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.is_excluded_file(&name) {
            self.excluded_files.push(name);
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ScanConfig::builder()
            .root("/home/user")
            .threads(4usize)
            .algorithm(DigestAlgorithm::Blake2b)
            .build()
            .unwrap();

        assert_eq!(config.root, PathBuf::from("/home/user"));
        assert_eq!(config.threads, 4);
        assert_eq!(config.algorithm, DigestAlgorithm::Blake2b);
        assert!(config.is_excluded_dir(".git"));
        assert!(config.is_excluded_file(DEFAULT_BASELINE_FILE));
    }

    #[test]
    fn test_builder_rejects_bad_names() {
        let result = ScanConfig::builder()
            .root("/test")
            .excluded_dirs(vec!["ok".to_string(), "a/b".to_string()])
            .build();
        assert!(result.is_err());

        let result = ScanConfig::builder()
            .root("/test")
            .excluded_files(vec!["  ".to_string()])
            .build();
        assert!(result.is_err());

        assert!(ScanConfig::builder().build().is_err());
    }

    #[test]
    fn test_validate_plain_struct() {
        let mut config = ScanConfig::new("/test");
        assert!(config.validate().is_ok());

        config.excluded_dirs.push(String::new());
        assert!(matches!(
            config.validate(),
            Err(ScanError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_exclude_file_dedup() {
        let mut config = ScanConfig::new("/test");
        let before = config.excluded_files.len();
        config.exclude_file(DEFAULT_STATUS_FILE);
        config.exclude_file("fixity");
        assert_eq!(config.excluded_files.len(), before + 1);
        assert!(config.is_excluded_file("fixity"));
    }

    #[test]
    fn test_algorithm_parse() {
        assert_eq!("BLAKE3".parse::<DigestAlgorithm>(), Ok(DigestAlgorithm::Blake3));
        assert_eq!("blake2b".parse::<DigestAlgorithm>(), Ok(DigestAlgorithm::Blake2b));
        assert!("md5".parse::<DigestAlgorithm>().is_err());
        assert_eq!(DigestAlgorithm::Blake2b.hex_len(), 128);
    }
}
