//! TCP Server
//!
//! Accepts connections and hands each to its own thread.
//!
//! `run` returns only after every connection thread has been stopped and
//! joined, so no request can reach the engine once it has returned.

use std::io::{self, BufWriter, ErrorKind};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;

use crate::config::Config;
use crate::engine::Engine;
use crate::error::Result;
use crate::protocol::{write_reply, Reply};

use super::Connection;

/// How long the accept loop sleeps when no client is waiting
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Back-off after a failed accept (e.g. out of file descriptors)
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// What the accept loop does after `accept()` fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AcceptAction {
    /// Nothing pending; poll again shortly
    Idle,
    /// Try again immediately
    Retry,
    /// Transient failure; log, back off, keep accepting
    BackOff,
    /// The listener itself is unusable
    Fail,
}

fn accept_action(err: &io::Error) -> AcceptAction {
    match err.kind() {
        ErrorKind::WouldBlock => AcceptAction::Idle,
        ErrorKind::Interrupted => AcceptAction::Retry,
        ErrorKind::InvalidInput => AcceptAction::Fail,
        _ => AcceptAction::BackOff,
    }
}

/// A running connection thread and a handle on its socket
struct Worker {
    socket: TcpStream,
    thread: JoinHandle<()>,
}

/// TCP server for ScrollKV
pub struct Server {
    config: Config,
    engine: Arc<Engine>,
    listener: TcpListener,
    shutdown: Arc<AtomicBool>,
    active_connections: Arc<AtomicUsize>,
    workers: Mutex<Vec<Worker>>,
}

impl Server {
    /// Bind the listen address from `config`
    pub fn bind(config: Config, engine: Arc<Engine>) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr)?;
        listener.set_nonblocking(true)?;

        tracing::info!("Listening on {}", listener.local_addr()?);

        Ok(Self {
            config,
            engine,
            listener,
            shutdown: Arc::new(AtomicBool::new(false)),
            active_connections: Arc::new(AtomicUsize::new(0)),
            workers: Mutex::new(Vec::new()),
        })
    }

    /// Accept connections until shutdown is requested (blocking)
    ///
    /// Per-client setup failures and transient accept errors are logged and
    /// skipped. Before returning, every open connection is closed and its
    /// thread joined.
    pub fn run(&self) -> Result<()> {
        let result = self.accept_loop();
        self.stop_workers();
        tracing::info!("Server shut down");
        result
    }

    fn accept_loop(&self) -> Result<()> {
        while !self.shutdown.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    if let Err(e) = self.spawn_connection(stream, addr) {
                        tracing::warn!("Dropping connection from {}: {}", addr, e);
                    }
                    self.reap_finished();
                }
                Err(e) => match accept_action(&e) {
                    AcceptAction::Idle => thread::sleep(ACCEPT_POLL_INTERVAL),
                    AcceptAction::Retry => continue,
                    AcceptAction::BackOff => {
                        tracing::warn!("Accept failed, retrying: {}", e);
                        thread::sleep(ACCEPT_ERROR_BACKOFF);
                    }
                    AcceptAction::Fail => {
                        tracing::error!("Listener failed: {}", e);
                        return Err(e.into());
                    }
                },
            }
        }
        Ok(())
    }

    fn spawn_connection(&self, stream: TcpStream, addr: SocketAddr) -> Result<()> {
        // Accepted sockets may inherit non-blocking mode from the listener
        stream.set_nonblocking(false)?;

        if self.active_connections.load(Ordering::SeqCst) >= self.config.max_connections {
            tracing::warn!("Rejecting {}: connection limit reached", addr);
            let mut writer = BufWriter::new(stream);
            let _ = write_reply(&mut writer, &Reply::error(Value::Null, "too many connections"));
            return Ok(());
        }

        let socket = stream.try_clone()?;
        let mut connection = Connection::new(stream, Arc::clone(&self.engine))?;
        connection.set_timeouts(self.config.read_timeout_ms, self.config.write_timeout_ms)?;

        let active = Arc::clone(&self.active_connections);
        active.fetch_add(1, Ordering::SeqCst);

        let spawned = thread::Builder::new()
            .name(format!("scrollkv-conn-{}", addr))
            .spawn(move || {
                if let Err(e) = connection.handle() {
                    tracing::debug!("Connection {} ended with error: {}", connection.peer_addr(), e);
                }
                active.fetch_sub(1, Ordering::SeqCst);
            });

        match spawned {
            Ok(thread) => {
                self.workers.lock().push(Worker { socket, thread });
                Ok(())
            }
            Err(e) => {
                self.active_connections.fetch_sub(1, Ordering::SeqCst);
                Err(e.into())
            }
        }
    }

    /// Drop handles of connections that already ended
    fn reap_finished(&self) {
        let mut workers = self.workers.lock();
        let (done, running): (Vec<_>, Vec<_>) =
            workers.drain(..).partition(|w| w.thread.is_finished());
        *workers = running;
        drop(workers);

        for worker in done {
            let _ = worker.thread.join();
        }
    }

    /// Close every client socket and wait for its thread to exit
    ///
    /// A request already inside the engine completes first; its reply write
    /// then fails and the thread ends.
    fn stop_workers(&self) {
        let workers: Vec<Worker> = self.workers.lock().drain(..).collect();
        if !workers.is_empty() {
            tracing::info!("Closing {} open connections", workers.len());
        }

        for worker in &workers {
            let _ = worker.socket.shutdown(Shutdown::Both);
        }
        for worker in workers {
            if worker.thread.join().is_err() {
                tracing::error!("Connection thread panicked");
            }
        }
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Flag that stops `run` when set; usable from other threads
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// The bound address (useful when listening on port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Number of connections currently being served
    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::SeqCst)
    }
}
