//! Error types for ScrollKV
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type alias using ScrollError
pub type Result<T> = std::result::Result<T, ScrollError>;

/// Unified error type for ScrollKV operations
#[derive(Debug, Error)]
pub enum ScrollError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Input Errors
    // -------------------------------------------------------------------------
    /// Key is not a string/number, is empty, or contains a delimiter
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Cannot read storage directory {}: {source}", .path.display())]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Flush write to {} failed: {source}", .path.display())]
    FlushWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Timed out after {0:?} waiting for the readiness gate")]
    FlushTimeout(Duration),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Host / Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ScrollError {
    fn from(err: serde_json::Error) -> Self {
        ScrollError::Serialization(err.to_string())
    }
}
