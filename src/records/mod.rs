//! Records Module
//!
//! In-memory record collections held by the engine.
//!
//! ## Responsibilities
//! - Keep records in insertion order (the order they are written to the log)
//! - Point lookups, in-place updates and removal by key
//! - Move records from the pending set into the committed set on flush
//!
//! ## Data Structure Choice
//! A plain `Vec<Record>` searched linearly. Lookups are O(n); the store does
//! no indexing beyond a scan.

mod set;

pub use set::RecordSet;
