//! Tests for the periodic Flusher
//!
//! These tests verify:
//! - Dirty engines are flushed on the next tick
//! - Clean engines are left alone
//! - Stopping is prompt and leaves data durable
//! - A failed flush is retried on a later tick

use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use scrollkv::config::Config;
use scrollkv::{Engine, Flusher};
use serde_json::json;
use tempfile::TempDir;

fn open_engine(temp_dir: &TempDir) -> Arc<Engine> {
    let config = Config::builder().data_dir(temp_dir.path()).build();
    Arc::new(Engine::open(config).unwrap())
}

fn wait_until<F: Fn() -> bool>(condition: F, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

#[test]
fn test_flusher_flushes_dirty_engine() {
    let temp_dir = TempDir::new().unwrap();
    let engine = open_engine(&temp_dir);
    let flusher = Flusher::spawn(Arc::clone(&engine), Duration::from_millis(10)).unwrap();

    engine.set("a", json!(1)).unwrap();
    engine.set("b", json!(2)).unwrap();

    assert!(wait_until(
        || !engine.is_dirty() && engine.pending_len().unwrap() == 0,
        Duration::from_secs(5)
    ));
    flusher.stop();

    let reopened = open_engine(&temp_dir);
    assert_eq!(reopened.count().unwrap(), 2);
}

#[test]
fn test_flusher_skips_clean_engine() {
    let temp_dir = TempDir::new().unwrap();
    let engine = open_engine(&temp_dir);
    let flusher = Flusher::spawn(Arc::clone(&engine), Duration::from_millis(10)).unwrap();

    thread::sleep(Duration::from_millis(100));
    flusher.stop();

    assert!(!engine.segment_path().exists());
}

#[test]
fn test_flusher_stop_is_prompt() {
    let temp_dir = TempDir::new().unwrap();
    let engine = open_engine(&temp_dir);
    let flusher = Flusher::spawn(Arc::clone(&engine), Duration::from_secs(3600)).unwrap();
    assert!(flusher.is_running());

    let start = Instant::now();
    flusher.stop();

    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_flusher_drop_stops_thread() {
    let temp_dir = TempDir::new().unwrap();
    let engine = open_engine(&temp_dir);

    {
        let _flusher = Flusher::spawn(Arc::clone(&engine), Duration::from_millis(10)).unwrap();
    }

    // Only the test's handle remains once the thread has exited
    assert_eq!(Arc::strong_count(&engine), 1);
}

#[test]
fn test_flusher_retries_after_failed_flush() {
    let temp_dir = TempDir::new().unwrap();
    let engine = open_engine(&temp_dir);
    // A directory where the segment should be makes every write fail
    fs::create_dir(engine.segment_path()).unwrap();

    engine.set("a", json!(1)).unwrap();
    let flusher = Flusher::spawn(Arc::clone(&engine), Duration::from_millis(10)).unwrap();

    // Several ticks fail; the thread survives and nothing migrates
    thread::sleep(Duration::from_millis(100));
    assert!(flusher.is_running());
    assert_eq!(engine.pending_len().unwrap(), 1);
    assert!(engine.segment_path().is_dir());

    fs::remove_dir(engine.segment_path()).unwrap();

    assert!(wait_until(
        || !engine.is_dirty() && engine.pending_len().unwrap() == 0,
        Duration::from_secs(5)
    ));
    assert!(flusher.is_running());
    flusher.stop();

    let reopened = open_engine(&temp_dir);
    assert_eq!(reopened.count().unwrap(), 1);
}
