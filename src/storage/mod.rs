//! Storage Module
//!
//! The on-disk side of the store: log segments in a single directory.
//!
//! ## Responsibilities
//! - Discover and decode every segment on startup
//! - Rewrite the active segment with the committed set (compaction)
//! - Append the pending set to the active segment
//!
//! ## Layout
//! ```text
//! {data_dir}/
//!   ├── store.log        (active segment, rewritten on every flush)
//!   └── *                (any other regular file is read once at startup)
//! ```
//! Segments hold codec text only. No header, checksum, or version.

mod log_file;
mod recovery;

pub use log_file::LogFile;
pub use recovery::{recover, Recovered, RecoveryStats};
