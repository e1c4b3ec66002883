//! Startup recovery
//!
//! Rebuilds the committed set from every segment in the storage directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::codec;
use crate::error::{Result, ScrollError};
use crate::records::RecordSet;

/// Outcome of scanning the storage directory
#[derive(Debug)]
pub struct Recovered {
    /// Merged records, later segments winning for repeated keys
    pub records: RecordSet,

    /// Segment files that were read, in the order they were applied
    pub segments: Vec<PathBuf>,

    pub stats: RecoveryStats,
}

/// Counters reported after recovery
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryStats {
    pub files_read: usize,

    /// Records decoded across all segments, before merging
    pub records_decoded: usize,

    /// Records that overwrote an earlier record with the same key
    pub duplicates_resolved: usize,

    /// Values that were not valid JSON and were kept as raw text
    pub raw_values: usize,
}

/// Read and merge every regular file in `dir`
///
/// Files are applied in file-name order. A repeated key keeps its first
/// position and takes the value of its last occurrence.
pub fn recover(dir: &Path) -> Result<Recovered> {
    let segments = list_segments(dir)?;

    let mut records = RecordSet::new();
    let mut stats = RecoveryStats::default();

    for path in &segments {
        let bytes = fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);
        let decoded = codec::decode(&text);

        tracing::debug!("Decoded {} records from {}", decoded.len(), path.display());

        stats.files_read += 1;
        stats.records_decoded += decoded.len();
        for record in decoded {
            if record.value.is_raw() {
                stats.raw_values += 1;
            }
            if records.contains(&record.key) {
                stats.duplicates_resolved += 1;
            }
            records.upsert(record);
        }
    }

    Ok(Recovered {
        records,
        segments,
        stats,
    })
}

/// Regular files in `dir`, sorted by file name
fn list_segments(dir: &Path) -> Result<Vec<PathBuf>> {
    let read_error = |source| ScrollError::DirectoryRead {
        path: dir.to_path_buf(),
        source,
    };

    let mut segments = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        if path.is_file() {
            segments.push(path);
        }
    }

    segments.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(segments)
}
