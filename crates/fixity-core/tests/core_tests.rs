use fixity_core::{
    Baseline, ChangedFile, Checksum, CurrentScan, DigestAlgorithm, FailedFile, FileRecord,
    MatchedFile, MissingFile, NewFile, ScanConfig, StatusReport,
};

#[test]
fn test_file_record_wire_format() {
    let record = FileRecord::new("docs/readme.md", "abc123");
    let json = serde_json::to_value(&record).unwrap();

    assert_eq!(json["file_path"], "docs/readme.md");
    assert_eq!(json["checksum"], "abc123");

    let parsed: FileRecord =
        serde_json::from_str(r#"{"file_path":"a.txt","checksum":"ff"}"#).unwrap();
    assert_eq!(parsed, FileRecord::new("a.txt", "ff"));
}

#[test]
fn test_baseline_serializes_as_array() {
    let baseline = Baseline::from_records(vec![
        FileRecord::new("b.txt", "bbb"),
        FileRecord::new("a.txt", "aaa"),
    ])
    .unwrap();

    let json = serde_json::to_string(&baseline).unwrap();
    assert_eq!(
        json,
        r#"[{"file_path":"a.txt","checksum":"aaa"},{"file_path":"b.txt","checksum":"bbb"}]"#
    );
}

#[test]
fn test_status_report_wire_format() {
    let report = StatusReport {
        matched: vec![MatchedFile {
            path: "same.txt".into(),
            checksum: Checksum::new("111"),
        }],
        changed: vec![ChangedFile {
            path: "x.txt".into(),
            stored_checksum: Checksum::new("aaa"),
            current_checksum: Checksum::new("ccc"),
        }],
        new: vec![NewFile {
            path: "n.txt".into(),
            current_checksum: Checksum::new("ddd"),
        }],
        missing: vec![MissingFile {
            path: "m.txt".into(),
            checksum: Checksum::new("eee"),
        }],
        relocated: Vec::new(),
        failed: vec![FailedFile {
            path: "locked.bin".into(),
            error: "Permission denied".into(),
            stored_checksum: None,
        }],
    };

    let json = serde_json::to_value(&report).unwrap();

    // Matched entries stay out of the file.
    assert!(json.get("matched").is_none());
    assert_eq!(json["changed"][0]["file"], "x.txt");
    assert_eq!(json["changed"][0]["stored_checksum"], "aaa");
    assert_eq!(json["changed"][0]["current_checksum"], "ccc");
    assert_eq!(json["new"][0]["current_checksum"], "ddd");
    assert_eq!(json["missing"][0]["checksum"], "eee");
    assert!(json["missing"][0].get("current_checksum").is_none());
    assert!(json["relocated"].as_array().unwrap().is_empty());
    assert!(json["failed"][0].get("stored_checksum").is_none());
}

#[test]
fn test_scan_collects_from_pairs() {
    let scan: CurrentScan = [("x.txt", "aaa"), ("z.txt", "bbb")].into_iter().collect();

    assert_eq!(scan.len(), 2);
    assert_eq!(scan.get("z.txt"), Some(&Checksum::new("bbb")));
    assert_eq!(scan.failure_count(), 0);
}

#[test]
fn test_scan_config_serde_defaults() {
    let config: ScanConfig = serde_json::from_str(r#"{"root":"/data"}"#).unwrap();

    assert_eq!(config.algorithm, DigestAlgorithm::Blake3);
    assert!(config.is_excluded_dir("$RECYCLE.BIN"));
    assert!(config.is_excluded_file("status-checksums.json"));
    assert_eq!(config.threads, 0);
}
