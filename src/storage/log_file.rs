//! Active log segment
//!
//! Writes for both flush phases. Every write is synced before returning.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::codec::{self, Record};
use crate::error::{Result, ScrollError};

/// Handle on the segment file flushes write to
#[derive(Debug, Clone)]
pub struct LogFile {
    path: PathBuf,
}

impl LogFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Replace the segment's contents with `records` (truncate and write)
    ///
    /// Returns the number of bytes written.
    pub fn rewrite(&self, records: &[Record]) -> Result<usize> {
        let text = codec::encode(records);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| self.write_error(e))?;
        self.write_synced(file, &text)?;
        Ok(text.len())
    }

    /// Append `records` to the end of the segment
    ///
    /// Returns the number of bytes written.
    pub fn append(&self, records: &[Record]) -> Result<usize> {
        let text = codec::encode(records);
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|e| self.write_error(e))?;
        self.write_synced(file, &text)?;
        Ok(text.len())
    }

    fn write_synced(&self, mut file: File, text: &str) -> Result<()> {
        file.write_all(text.as_bytes())
            .and_then(|_| file.sync_data())
            .map_err(|e| self.write_error(e))
    }

    fn write_error(&self, source: std::io::Error) -> ScrollError {
        ScrollError::FlushWrite {
            path: self.path.clone(),
            source,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}
