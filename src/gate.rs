//! Readiness Gate
//!
//! Single-writer coordination for the engine's in-memory state.
//!
//! Every public engine operation and each flush phase passes through the gate.
//! At most one holder exists at a time; everyone else blocks until the holder
//! releases it. Release is tied to the guard's lifetime, so an error or panic
//! inside the protected section still reopens the gate.
//!
//! Waiters are parked by `parking_lot`, which is eventually fair but does not
//! promise FIFO order among callers blocked behind a flush.

use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};

use crate::error::{Result, ScrollError};

/// Exclusive access to `T`, with an optional limit on how long callers wait
pub struct ReadinessGate<T> {
    state: Mutex<T>,
    wait_limit: Option<Duration>,
}

/// Scoped holder of the gate; dropping it reopens the gate
pub type GateGuard<'a, T> = MutexGuard<'a, T>;

impl<T> ReadinessGate<T> {
    /// Create an open gate around `state`
    pub fn new(state: T, wait_limit: Option<Duration>) -> Self {
        Self {
            state: Mutex::new(state),
            wait_limit,
        }
    }

    /// Block until the gate is open, then close it for the caller
    ///
    /// Fails with `FlushTimeout` if a wait limit is configured and the gate
    /// stays closed longer than that.
    pub fn acquire(&self) -> Result<GateGuard<'_, T>> {
        match self.wait_limit {
            None => Ok(self.state.lock()),
            Some(limit) => self
                .state
                .try_lock_for(limit)
                .ok_or(ScrollError::FlushTimeout(limit)),
        }
    }

    /// Whether the gate is currently open
    pub fn is_ready(&self) -> bool {
        !self.state.is_locked()
    }

    pub fn wait_limit(&self) -> Option<Duration> {
        self.wait_limit
    }

    /// Consume the gate, returning the protected state
    pub fn into_inner(self) -> T {
        self.state.into_inner()
    }
}
