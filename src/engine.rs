//! Engine Module
//!
//! The storage engine that owns the record sets and drives flushes.
//!
//! ## Responsibilities
//! - Rebuild the committed set from disk on startup
//! - Serve count/get/set/delete from memory
//! - Track unflushed mutations with the dirty flag
//! - Make memory durable with the two-phase flush (compaction, then append)

use std::ffi::OsStr;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde_json::Value;

use crate::codec::{normalize_key, Record, StoredValue};
use crate::config::Config;
use crate::error::Result;
use crate::gate::ReadinessGate;
use crate::protocol::Command;
use crate::records::RecordSet;
use crate::storage::{self, LogFile};

/// State guarded by the readiness gate
#[derive(Debug, Default)]
struct EngineState {
    /// Records considered durable as of the last successful flush
    committed: RecordSet,

    /// Records not yet written to disk
    pending: RecordSet,

    /// Segments read at startup other than the active one. Their contents
    /// live in `committed`, so they are removed after the next compaction.
    absorbed: Vec<PathBuf>,
}

/// The main storage engine
///
/// ## Concurrency Model
///
/// - Every public operation holds the readiness gate for its whole duration,
///   so a key is never visible in both `pending` and `committed`.
/// - A flush takes the gate twice, once per phase, and holds it across the
///   file write. Operations arriving mid-flush block until the phase ends.
/// - `flush_lock` serializes whole flush cycles; a second flush waits for
///   the first to finish both phases.
///
/// ## Key Placement
/// - New keys go to `pending`.
/// - Updates to a key already in `committed` stay in `committed` and are
///   persisted by the next compaction.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Active segment written by flushes
    log: LogFile,

    /// Record sets, behind the single-writer gate
    gate: ReadinessGate<EngineState>,

    /// Set by every mutation, cleared when a flush cycle starts
    dirty: AtomicBool,

    /// Serializes flush cycles
    flush_lock: Mutex<()>,
}

impl Engine {
    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Create the storage directory if it doesn't exist
    /// 2. Read every segment and merge it into the committed set
    /// 3. Ready to serve requests
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        // Step 1: Create data directory if it doesn't exist
        fs::create_dir_all(&config.data_dir)?;

        // Step 2: Recover committed records from all segments
        let recovered = storage::recover(&config.data_dir)?;
        let stats = &recovered.stats;

        if stats.files_read > 0 {
            tracing::info!(
                "Recovered {} records from {} segments ({} duplicates resolved, {} raw values)",
                recovered.records.len(),
                stats.files_read,
                stats.duplicates_resolved,
                stats.raw_values
            );
        }

        let active = OsStr::new(&config.segment_name);
        let absorbed: Vec<PathBuf> = recovered
            .segments
            .into_iter()
            .filter(|path| path.file_name() != Some(active))
            .collect();

        // Segments that need merging into the active one make the store dirty
        let dirty = !absorbed.is_empty() || stats.duplicates_resolved > 0;
        if !absorbed.is_empty() {
            tracing::info!(
                "{} extra segments will be folded into {} on the next flush",
                absorbed.len(),
                config.segment_name
            );
        }

        let state = EngineState {
            committed: recovered.records,
            pending: RecordSet::new(),
            absorbed,
        };

        Ok(Self {
            log: LogFile::new(config.segment_path()),
            gate: ReadinessGate::new(state, config.gate_timeout()),
            dirty: AtomicBool::new(dirty),
            flush_lock: Mutex::new(()),
            config,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(config)
    }

    /// Execute a host command
    ///
    /// Returns the JSON result for the reply: count → number, get → value or
    /// `null`, set → `{key: value}`, delete → `true`.
    pub fn execute(&self, command: Command) -> Result<Value> {
        match command {
            Command::Count => Ok(Value::from(self.count()?)),
            Command::Get { key } => Ok(self
                .get(key)?
                .map(|record| record.value.to_json())
                .unwrap_or(Value::Null)),
            Command::Set { key, value } => Ok(self.set(key, value)?.to_json()),
            Command::Delete { key } => Ok(Value::Bool(self.delete(key)?)),
        }
    }

    /// Number of live keys across pending and committed
    pub fn count(&self) -> Result<usize> {
        let state = self.gate.acquire()?;
        Ok(state.committed.len() + state.pending.len())
    }

    /// Get the record for a key
    ///
    /// Search order:
    /// 1. Pending (unflushed writes)
    /// 2. Committed
    pub fn get(&self, key: impl Into<Value>) -> Result<Option<Record>> {
        let key = normalize_key(&key.into())?;
        let state = self.gate.acquire()?;

        let found = state
            .pending
            .get(&key)
            .or_else(|| state.committed.get(&key))
            .cloned();

        tracing::trace!("get {:?} -> {}", key, if found.is_some() { "hit" } else { "miss" });
        Ok(found)
    }

    /// Store a value under a key
    ///
    /// Overwrites in whichever set already holds the key; new keys are
    /// appended to pending. Never touches disk.
    pub fn set(&self, key: impl Into<Value>, value: impl Into<Value>) -> Result<Record> {
        let key = normalize_key(&key.into())?;
        let value = StoredValue::Structured(value.into());

        let mut guard = self.gate.acquire()?;
        let state = &mut *guard;

        let record = match state.pending.replace(&key, value.clone()) {
            Some(updated) => updated.clone(),
            None => match state.committed.replace(&key, value.clone()) {
                Some(updated) => updated.clone(),
                None => state.pending.push(Record::new(key, value)).clone(),
            },
        };

        self.mark_dirty();
        tracing::trace!("set {:?}", record.key);
        Ok(record)
    }

    /// Remove a key from both sets
    ///
    /// Deleting an absent key is a no-op that still reports success.
    pub fn delete(&self, key: impl Into<Value>) -> Result<bool> {
        let key = normalize_key(&key.into())?;

        let mut guard = self.gate.acquire()?;
        let state = &mut *guard;
        let removed_pending = state.pending.remove(&key).is_some();
        let removed_committed = state.committed.remove(&key).is_some();

        self.mark_dirty();
        tracing::trace!(
            "delete {:?} (pending: {}, committed: {})",
            key,
            removed_pending,
            removed_committed
        );
        Ok(true)
    }

    /// Make the in-memory state durable
    ///
    /// 1. Compaction: rewrite the active segment with the committed set
    /// 2. Append: write the pending set after it, then move pending into
    ///    committed
    ///
    /// A failure in either phase is logged and returned; the gate is released
    /// and the dirty flag is raised again so the next cycle retries.
    pub fn flush_all(&self) -> Result<()> {
        let _cycle = self.flush_lock.lock();
        self.dirty.store(false, Ordering::SeqCst);

        let result = self.compact().and_then(|_| self.append_pending());
        if let Err(e) = &result {
            self.mark_dirty();
            tracing::error!("Flush of {} failed: {}", self.log.path().display(), e);
        }
        result
    }

    /// Phase 1: truncate the segment and write the committed set
    fn compact(&self) -> Result<()> {
        let mut state = self.gate.acquire()?;

        let bytes = self.log.rewrite(state.committed.as_slice())?;
        tracing::debug!(
            "Compacted {} committed records ({} bytes) into {}",
            state.committed.len(),
            bytes,
            self.log.path().display()
        );

        state.absorbed.retain(|path| match fs::remove_file(path) {
            Ok(()) => {
                tracing::info!("Removed absorbed segment {}", path.display());
                false
            }
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                tracing::warn!("Could not remove absorbed segment {}: {}", path.display(), e);
                true
            }
        });

        Ok(())
    }

    /// Phase 2: append the pending set and migrate it into committed
    fn append_pending(&self) -> Result<()> {
        let mut guard = self.gate.acquire()?;
        let state = &mut *guard;

        if state.pending.is_empty() {
            return Ok(());
        }

        let bytes = self.log.append(state.pending.as_slice())?;
        tracing::debug!(
            "Appended {} pending records ({} bytes) to {}",
            state.pending.len(),
            bytes,
            self.log.path().display()
        );

        state.committed.absorb(&mut state.pending);
        Ok(())
    }

    /// Close the engine gracefully
    ///
    /// Flushes only if there are unflushed mutations.
    pub fn close(self) -> Result<()> {
        if self.is_dirty() {
            tracing::info!("Flushing unsaved changes before close");
            self.flush_all()?;
        }
        Ok(())
    }

    fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::SeqCst);
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Whether mutations exist that no flush has written yet
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Whether the readiness gate is open (no operation or flush in progress)
    pub fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }

    /// Number of records in the committed set
    pub fn committed_len(&self) -> Result<usize> {
        Ok(self.gate.acquire()?.committed.len())
    }

    /// Number of records in the pending set
    pub fn pending_len(&self) -> Result<usize> {
        Ok(self.gate.acquire()?.pending.len())
    }

    /// Path of the active log segment
    pub fn segment_path(&self) -> &Path {
        self.log.path()
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
