//! Tests for the storage layer
//!
//! These tests verify:
//! - LogFile rewrite truncates and append extends
//! - Recovery reads every regular file in name order
//! - Duplicate keys across segments resolve to the last write
//! - Directory and write failures map to their error kinds

use std::fs;

use scrollkv::codec::{decode, Record, StoredValue};
use scrollkv::storage::{recover, LogFile};
use scrollkv::ScrollError;
use serde_json::json;
use tempfile::TempDir;

// =============================================================================
// LogFile Tests
// =============================================================================

#[test]
fn test_rewrite_creates_file() {
    let temp = TempDir::new().unwrap();
    let log = LogFile::new(temp.path().join("store.log"));

    assert!(!log.exists());
    let bytes = log.rewrite(&[Record::new("a", json!(1))]).unwrap();

    assert!(log.exists());
    assert_eq!(bytes, "\na:1".len());
    assert_eq!(fs::read_to_string(log.path()).unwrap(), "\na:1");
}

#[test]
fn test_rewrite_truncates_previous_content() {
    let temp = TempDir::new().unwrap();
    let log = LogFile::new(temp.path().join("store.log"));

    log.rewrite(&[Record::new("a", json!(1)), Record::new("b", json!(2))]).unwrap();
    log.rewrite(&[Record::new("b", json!(2))]).unwrap();

    assert_eq!(fs::read_to_string(log.path()).unwrap(), "\nb:2");
}

#[test]
fn test_rewrite_empty_leaves_empty_file() {
    let temp = TempDir::new().unwrap();
    let log = LogFile::new(temp.path().join("store.log"));

    log.rewrite(&[Record::new("a", json!(1))]).unwrap();
    assert_eq!(log.rewrite(&[]).unwrap(), 0);

    assert_eq!(fs::read_to_string(log.path()).unwrap(), "");
}

#[test]
fn test_append_after_rewrite() {
    let temp = TempDir::new().unwrap();
    let log = LogFile::new(temp.path().join("store.log"));

    log.rewrite(&[Record::new("a", json!(1))]).unwrap();
    log.append(&[Record::new("b", json!({"x": 2}))]).unwrap();

    let text = fs::read_to_string(log.path()).unwrap();
    assert_eq!(
        decode(&text),
        vec![Record::new("a", json!(1)), Record::new("b", json!({"x": 2}))]
    );
}

#[test]
fn test_write_into_missing_directory_is_flush_write_error() {
    let temp = TempDir::new().unwrap();
    let log = LogFile::new(temp.path().join("missing").join("store.log"));

    let err = log.rewrite(&[Record::new("a", json!(1))]).unwrap_err();
    assert!(matches!(err, ScrollError::FlushWrite { .. }));

    let err = log.append(&[Record::new("a", json!(1))]).unwrap_err();
    assert!(matches!(err, ScrollError::FlushWrite { .. }));
}

// =============================================================================
// Recovery Tests
// =============================================================================

#[test]
fn test_recover_empty_directory() {
    let temp = TempDir::new().unwrap();

    let recovered = recover(temp.path()).unwrap();

    assert!(recovered.records.is_empty());
    assert!(recovered.segments.is_empty());
    assert_eq!(recovered.stats.files_read, 0);
}

#[test]
fn test_recover_missing_directory_fails() {
    let temp = TempDir::new().unwrap();

    let err = recover(&temp.path().join("nope")).unwrap_err();

    assert!(matches!(err, ScrollError::DirectoryRead { .. }));
}

#[test]
fn test_recover_reads_files_in_name_order() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("b.log"), "\nk:\"second\"\ny:2").unwrap();
    fs::write(temp.path().join("a.log"), "\nk:\"first\"\nx:1").unwrap();

    let recovered = recover(temp.path()).unwrap();

    let names: Vec<_> = recovered
        .segments
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a.log", "b.log"]);

    let records = recovered.records.as_slice();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0], Record::new("k", json!("second")));
    assert_eq!(records[1], Record::new("x", json!(1)));
    assert_eq!(records[2], Record::new("y", json!(2)));
    assert_eq!(recovered.stats.duplicates_resolved, 1);
    assert_eq!(recovered.stats.records_decoded, 4);
}

#[test]
fn test_recover_skips_directories() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("subdir")).unwrap();
    fs::write(temp.path().join("subdir").join("inner.log"), "\nhidden:1").unwrap();
    fs::write(temp.path().join("store.log"), "\nvisible:1").unwrap();

    let recovered = recover(temp.path()).unwrap();

    assert_eq!(recovered.stats.files_read, 1);
    assert!(recovered.records.contains("visible"));
    assert!(!recovered.records.contains("hidden"));
}

#[test]
fn test_recover_counts_raw_values() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("store.log"), "\na:1\nb:plain text").unwrap();

    let recovered = recover(temp.path()).unwrap();

    assert_eq!(recovered.stats.raw_values, 1);
    assert_eq!(
        recovered.records.get("b").unwrap().value,
        StoredValue::Raw("plain text".to_string())
    );
}
