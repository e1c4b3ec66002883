//! Periodic Flusher
//!
//! Background thread that flushes the engine whenever the dirty flag is set.
//!
//! A flush is attempted at most once per tick. Failures are logged and the
//! thread keeps running; the engine re-raises its dirty flag on failure, so
//! the next tick retries.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Sender};
use crossbeam::select;

use crate::engine::Engine;
use crate::error::Result;

/// Handle on the running flusher thread
pub struct Flusher {
    shutdown: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Flusher {
    /// Start flushing `engine` every `interval`
    ///
    /// Call only after the engine has finished opening.
    pub fn spawn(engine: Arc<Engine>, interval: Duration) -> Result<Self> {
        let (shutdown_tx, shutdown_rx) = channel::bounded::<()>(0);
        let ticker = channel::tick(interval);

        let handle = thread::Builder::new()
            .name("scrollkv-flusher".to_string())
            .spawn(move || {
                tracing::debug!("Flusher started (interval {:?})", interval);
                loop {
                    select! {
                        recv(ticker) -> _ => {
                            if engine.is_dirty() {
                                // flush_all has already logged the failure
                                let _ = engine.flush_all();
                            }
                        }
                        recv(shutdown_rx) -> _ => break,
                    }
                }
                tracing::debug!("Flusher stopped");
            })?;

        Ok(Self {
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Stop the thread and wait for any in-flight flush to finish
    pub fn stop(mut self) {
        self.shutdown_and_join();
    }

    fn shutdown_and_join(&mut self) {
        // Dropping the sender disconnects the channel and wakes the select
        drop(self.shutdown.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Flusher thread panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Flusher {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}
