//! # ScrollKV
//!
//! An embedded key-value store backed by an append-style log file:
//! - Reads and writes served entirely from memory
//! - Periodic two-phase flush (compaction, then append)
//! - Recovery from every log segment in the storage directory
//! - Single-writer coordination through a readiness gate
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Host (TCP, JSON lines)                       │
//! │          {id, method, params} → {request, response}          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     Readiness Gate                           │
//! │              (one holder at a time)                          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   Pending   │ ──flush─▶│  Committed  │
//!   │  (new keys) │          │ (durable)   │
//!   └──────┬──────┘          └──────┬──────┘
//!          │ append                 │ rewrite
//!          ▼                        ▼
//!   ┌──────────────────────────────────────┐
//!   │          Log segment (codec text)     │
//!   └──────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod records;
pub mod gate;
pub mod storage;
pub mod engine;
pub mod flusher;
pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ScrollError, Result};
pub use config::Config;
pub use codec::{Record, StoredValue};
pub use engine::Engine;
pub use flusher::Flusher;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of ScrollKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
