//! Generate-then-compare runs over real directory trees.

use std::fs;
use std::path::Path;

use fixity_core::{DigestAlgorithm, ScanConfig, StatusReport};
use fixity_reconcile::{ReconcileConfig, Reconciler, RelocationPolicy};
use fixity_scan::{CurrentScan, HashCoordinator, PathFilter};
use fixity_store::{BaselineStore, StatusStore};
use tempfile::TempDir;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn scan(root: &Path, algorithm: DigestAlgorithm) -> CurrentScan {
    let config = ScanConfig::builder()
        .root(root)
        .algorithm(algorithm)
        .threads(2usize)
        .build()
        .unwrap();
    let (files, warnings) = PathFilter::new(&config).unwrap().collect();
    assert!(warnings.is_empty());

    let outcomes = HashCoordinator::from_config(&config).hash_all(files).unwrap();
    CurrentScan::from_outcomes(outcomes)
}

fn generate(root: &Path, algorithm: DigestAlgorithm) {
    let baseline = scan(root, algorithm).to_baseline();
    BaselineStore::in_dir(root).save(&baseline).unwrap();
}

fn compare(root: &Path, algorithm: DigestAlgorithm, relocation: RelocationPolicy) -> StatusReport {
    let baseline = BaselineStore::in_dir(root).load(algorithm).unwrap();
    let current = scan(root, algorithm);
    let report =
        Reconciler::with_config(ReconcileConfig { relocation }).reconcile(&baseline, &current);
    StatusStore::in_dir(root).save(&report).unwrap();
    report
}

fn sample_tree() -> TempDir {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "keep.txt", "unchanged");
    write(temp.path(), "edit.txt", "before");
    write(temp.path(), "gone.txt", "deleted soon");
    write(temp.path(), "photos/2019/trip.jpg", "jpeg bytes");
    write(temp.path(), ".git/HEAD", "ref: refs/heads/main");
    temp
}

#[test]
fn test_unchanged_tree_compares_clean() {
    let temp = sample_tree();
    generate(temp.path(), DigestAlgorithm::Blake3);

    // The report file written by the first compare must not show up in the second.
    for _ in 0..2 {
        let report = compare(temp.path(), DigestAlgorithm::Blake3, RelocationPolicy::Report);
        assert!(report.is_clean(), "{report:?}");
        assert_eq!(report.matched.len(), 4);
    }
}

#[test]
fn test_detects_every_kind_of_change() {
    let temp = sample_tree();
    generate(temp.path(), DigestAlgorithm::Blake3);

    write(temp.path(), "edit.txt", "after");
    fs::remove_file(temp.path().join("gone.txt")).unwrap();
    fs::create_dir_all(temp.path().join("archive")).unwrap();
    fs::rename(
        temp.path().join("photos/2019/trip.jpg"),
        temp.path().join("archive/trip.jpg"),
    )
    .unwrap();
    write(temp.path(), "added.md", "brand new");
    write(temp.path(), ".git/index", "ignored");

    let report = compare(temp.path(), DigestAlgorithm::Blake3, RelocationPolicy::Report);

    let matched: Vec<&str> = report.matched.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(matched, vec!["keep.txt"]);
    assert_eq!(report.changed.len(), 1);
    assert_eq!(report.changed[0].path, "edit.txt");
    assert_ne!(report.changed[0].stored_checksum, report.changed[0].current_checksum);
    assert_eq!(report.new.len(), 1);
    assert_eq!(report.new[0].path, "added.md");
    assert_eq!(report.missing.len(), 1);
    assert_eq!(report.missing[0].path, "gone.txt");
    assert_eq!(report.relocated.len(), 1);
    assert_eq!(report.relocated[0].from, "photos/2019/trip.jpg");
    assert_eq!(report.relocated[0].to, "archive/trip.jpg");
    assert!(report.failed.is_empty());
    assert!(report.has_differences());

    let status = StatusStore::in_dir(temp.path());
    let saved: StatusReport =
        serde_json::from_str(&fs::read_to_string(status.path()).unwrap()).unwrap();
    assert_eq!(saved.changed, report.changed);
    assert_eq!(saved.relocated, report.relocated);
    assert!(saved.matched.is_empty());
}

#[test]
fn test_suppressed_relocation_is_silent() {
    let temp = sample_tree();
    generate(temp.path(), DigestAlgorithm::Blake2b);

    fs::rename(temp.path().join("keep.txt"), temp.path().join("kept.txt")).unwrap();

    let report = compare(temp.path(), DigestAlgorithm::Blake2b, RelocationPolicy::Suppress);
    assert!(report.is_clean(), "{report:?}");
    assert_eq!(report.matched.len(), 3);
}

#[test]
fn test_regenerate_accepts_current_state() {
    let temp = sample_tree();
    generate(temp.path(), DigestAlgorithm::Blake3);

    write(temp.path(), "edit.txt", "after");
    assert!(!compare(temp.path(), DigestAlgorithm::Blake3, RelocationPolicy::Report).is_clean());

    generate(temp.path(), DigestAlgorithm::Blake3);
    assert!(compare(temp.path(), DigestAlgorithm::Blake3, RelocationPolicy::Report).is_clean());
}

#[test]
fn test_baseline_from_other_algorithm_is_rejected() {
    let temp = sample_tree();
    generate(temp.path(), DigestAlgorithm::Blake2b);

    let err = BaselineStore::in_dir(temp.path())
        .load(DigestAlgorithm::Blake3)
        .unwrap_err();
    assert!(err.is_malformed());
}
