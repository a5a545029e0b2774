//! JWalk-based path filter yielding the files eligible for checksumming.

use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use jwalk::{DirEntry, Parallelism, WalkDir};
use tracing::{debug, warn};

use fixity_core::{ScanConfig, ScanError, ScanWarning, WarningKind};

type EntryResult = Result<DirEntry<((), ())>, jwalk::Error>;

/// A file selected for hashing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    /// Absolute path used to open the file.
    pub path: PathBuf,
    /// Path relative to the scan root with `/` separators.
    pub relative: String,
}

impl CandidateFile {
    /// Create a candidate from an absolute path and its relative key.
    pub fn new(path: impl Into<PathBuf>, relative: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            relative: relative.into(),
        }
    }
}

/// Selects regular files under a root, honouring the configured exclusions.
pub struct PathFilter {
    config: ScanConfig,
    root: PathBuf,
    globs: GlobSet,
}

impl PathFilter {
    /// Validate the config and resolve the root directory.
    pub fn new(config: &ScanConfig) -> Result<Self, ScanError> {
        config.validate()?;

        let root = config
            .root
            .canonicalize()
            .map_err(|e| ScanError::io(&config.root, e))?;
        if !root.is_dir() {
            return Err(ScanError::NotADirectory { path: root });
        }

        let globs = build_globs(&config.exclude_globs)?;

        Ok(Self {
            config: config.clone(),
            root,
            globs,
        })
    }

    /// Canonical root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Start a lazy walk over the eligible files.
    pub fn walk(&self) -> FileWalk {
        let parallelism = match self.config.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: std::time::Duration::from_millis(100),
            },
            n => Parallelism::RayonNewPool(n),
        };

        let excluded_dirs = self.config.excluded_dirs.clone();
        let walker = WalkDir::new(&self.root)
            .parallelism(parallelism)
            .skip_hidden(false)
            .follow_links(false)
            .sort(true)
            .process_read_dir(move |_depth, _path, _state, children| {
                // Dropping the entry here also stops jwalk from descending into it.
                children.retain(|child| match child {
                    Ok(entry) => {
                        !(entry.file_type().is_dir()
                            && entry
                                .file_name()
                                .to_str()
                                .is_some_and(|name| excluded_dirs.iter().any(|d| d == name)))
                    }
                    Err(_) => true,
                });
            });

        FileWalk {
            entries: Box::new(walker.into_iter()),
            root: self.root.clone(),
            config: self.config.clone(),
            globs: self.globs.clone(),
            warnings: Vec::new(),
            skipped: 0,
        }
    }

    /// Walk the whole tree, returning the files and any warnings.
    pub fn collect(&self) -> (Vec<CandidateFile>, Vec<ScanWarning>) {
        let mut walk = self.walk();
        let files: Vec<CandidateFile> = walk.by_ref().collect();
        debug!(
            files = files.len(),
            skipped = walk.skipped(),
            "Path filter finished"
        );
        (files, walk.into_warnings())
    }
}

/// Lazy iterator over eligible files. Walk problems are kept as warnings.
pub struct FileWalk {
    entries: Box<dyn Iterator<Item = EntryResult>>,
    root: PathBuf,
    config: ScanConfig,
    globs: GlobSet,
    warnings: Vec<ScanWarning>,
    skipped: u64,
}

impl FileWalk {
    /// Warnings collected so far.
    pub fn warnings(&self) -> &[ScanWarning] {
        &self.warnings
    }

    /// Consume the walk, returning its warnings.
    pub fn into_warnings(self) -> Vec<ScanWarning> {
        self.warnings
    }

    /// Number of files skipped by name or glob exclusions.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl Iterator for FileWalk {
    type Item = CandidateFile;

    fn next(&mut self) -> Option<Self::Item> {
        for entry_result in self.entries.by_ref() {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    warn!(path = %path.display(), "{err}");
                    let mut warning =
                        ScanWarning::new(&path, err.to_string(), WarningKind::ReadError);
                    if let Some(relative) = relative_key(&self.root, &path) {
                        warning = warning.with_relative(relative);
                    }
                    self.warnings.push(warning);
                    continue;
                }
            };

            // Directories, symlinks and special files are never checksummed.
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let excluded_name = entry
                .file_name()
                .to_str()
                .is_some_and(|name| self.config.is_excluded_file(name));
            if excluded_name {
                debug!(path = %path.display(), "File skipped by name");
                self.skipped += 1;
                continue;
            }

            let Some(relative) = relative_key(&self.root, &path) else {
                let warning = ScanWarning::non_utf8(&path);
                warn!("{}", warning.message);
                self.warnings.push(warning);
                continue;
            };

            if self.globs.is_match(&relative) {
                debug!(path = %relative, "File skipped by pattern");
                self.skipped += 1;
                continue;
            }

            return Some(CandidateFile { path, relative });
        }
        None
    }
}

/// Relative path with `/` separators, or `None` if not UTF-8 or outside `root`.
fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            parts.push(part.to_str()?);
        }
    }
    Some(parts.join("/"))
}

fn build_globs(patterns: &[String]) -> Result<GlobSet, ScanError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| ScanError::invalid_config(format!("Invalid pattern {pattern}: {e}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| ScanError::invalid_config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir_all(root.join("docs/nested")).unwrap();
        fs::create_dir_all(root.join(".git/objects")).unwrap();
        fs::create_dir_all(root.join("$RECYCLE.BIN")).unwrap();

        fs::write(root.join("readme.md"), "hello").unwrap();
        fs::write(root.join(".hidden"), "still checked").unwrap();
        fs::write(root.join("docs/guide.md"), "guide").unwrap();
        fs::write(root.join("docs/nested/deep.txt"), "deep").unwrap();
        fs::write(root.join("docs/scratch.tmp"), "temp").unwrap();
        fs::write(root.join(".git/objects/abc"), "blob").unwrap();
        fs::write(root.join("$RECYCLE.BIN/old.txt"), "trash").unwrap();
        fs::write(root.join("all-checksums.json"), "[]").unwrap();
        fs::write(root.join("docs/status-checksums.json"), "{}").unwrap();

        temp
    }

    fn relative_paths(files: &[CandidateFile]) -> Vec<&str> {
        let mut paths: Vec<&str> = files.iter().map(|f| f.relative.as_str()).collect();
        paths.sort_unstable();
        paths
    }

    #[test]
    fn test_default_exclusions() {
        let temp = create_test_tree();
        let filter = PathFilter::new(&ScanConfig::new(temp.path())).unwrap();

        let (files, warnings) = filter.collect();

        assert!(warnings.is_empty());
        assert_eq!(
            relative_paths(&files),
            vec![
                ".hidden",
                "docs/guide.md",
                "docs/nested/deep.txt",
                "docs/scratch.tmp",
                "readme.md",
            ]
        );
        assert!(files.iter().all(|f| f.path.is_absolute()));
    }

    #[test]
    fn test_glob_exclusions() {
        let temp = create_test_tree();
        let config = ScanConfig::builder()
            .root(temp.path())
            .exclude_globs(vec!["**/*.tmp".to_string(), "docs/nested/**".to_string()])
            .build()
            .unwrap();
        let filter = PathFilter::new(&config).unwrap();

        let mut walk = filter.walk();
        let files: Vec<CandidateFile> = walk.by_ref().collect();

        assert_eq!(
            relative_paths(&files),
            vec![".hidden", "docs/guide.md", "readme.md"]
        );
        // Two globbed files plus the two report files excluded by name.
        assert_eq!(walk.skipped(), 4);
    }

    #[test]
    fn test_invalid_glob_is_config_error() {
        let temp = TempDir::new().unwrap();
        let config = ScanConfig::builder()
            .root(temp.path())
            .exclude_globs(vec!["a[".to_string()])
            .build()
            .unwrap();

        assert!(matches!(
            PathFilter::new(&config),
            Err(ScanError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_bad_roots() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file.txt");
        fs::write(&file, "x").unwrap();

        assert!(matches!(
            PathFilter::new(&ScanConfig::new(&file)),
            Err(ScanError::NotADirectory { .. })
        ));
        assert!(matches!(
            PathFilter::new(&ScanConfig::new(temp.path().join("absent"))),
            Err(ScanError::NotFound { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_skipped() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("target.txt"), "data").unwrap();
        std::os::unix::fs::symlink(temp.path().join("target.txt"), temp.path().join("link.txt"))
            .unwrap();

        let filter = PathFilter::new(&ScanConfig::new(temp.path())).unwrap();
        let (files, _) = filter.collect();

        assert_eq!(relative_paths(&files), vec!["target.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_dir_warning_has_relative_key() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let locked = temp.path().join("docs/locked");
        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("secret.txt"), "x").unwrap();
        fs::write(temp.path().join("docs/open.txt"), "y").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can still list it; nothing to check then.
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let filter = PathFilter::new(&ScanConfig::new(temp.path())).unwrap();
        let (files, warnings) = filter.collect();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(relative_paths(&files), vec!["docs/open.txt"]);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::ReadError);
        assert_eq!(warnings[0].relative.as_deref(), Some("docs/locked"));
    }

    #[test]
    fn test_relative_key_uses_forward_slashes() {
        let root = Path::new("/data/root");
        let path = root.join("a").join("b").join("c.txt");
        assert_eq!(relative_key(root, &path).as_deref(), Some("a/b/c.txt"));
        assert_eq!(relative_key(root, Path::new("/elsewhere/x")), None);
    }
}
