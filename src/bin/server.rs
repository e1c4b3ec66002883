//! ScrollKV Server Binary
//!
//! Serves the engine over TCP and flushes unsaved data on Ctrl+C.

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use clap::Parser;
use scrollkv::network::Server;
use scrollkv::{Config, Engine, Flusher};
use tracing_subscriber::{fmt, EnvFilter};

/// ScrollKV Server
///
/// Flags override the SCROLLKV_* environment variables.
#[derive(Parser, Debug)]
#[command(name = "scrollkv-server")]
#[command(about = "Embedded log-backed key-value store")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Listen address (host:port)
    #[arg(short, long)]
    listen: Option<String>,

    /// Maximum concurrent connections
    #[arg(short, long)]
    max_connections: Option<usize>,

    /// Flush check interval in milliseconds
    #[arg(short = 'i', long)]
    flush_interval_ms: Option<u64>,

    /// Active log segment file name
    #[arg(long)]
    segment: Option<String>,
}

impl Args {
    fn apply(self, mut config: Config) -> Config {
        if let Some(dir) = self.data_dir {
            config.data_dir = dir;
        }
        if let Some(addr) = self.listen {
            config.listen_addr = addr;
        }
        if let Some(max) = self.max_connections {
            config.max_connections = max;
        }
        if let Some(ms) = self.flush_interval_ms {
            config.flush_interval_ms = ms;
        }
        if let Some(name) = self.segment {
            config.segment_name = name;
        }
        config
    }
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,scrollkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    let config = match Config::from_env() {
        Ok(config) => args.apply(config),
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("ScrollKV Server v{}", scrollkv::VERSION);
    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!("Listen address: {}", config.listen_addr);

    if let Err(e) = run(config) {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}

fn run(config: Config) -> scrollkv::Result<()> {
    let engine = Arc::new(Engine::open(config.clone())?);
    tracing::info!("Engine initialized successfully");

    // The flusher starts only once recovery has completed
    let flusher = Flusher::spawn(Arc::clone(&engine), config.flush_interval())?;

    let server = Server::bind(config, Arc::clone(&engine))?;
    let shutdown = server.shutdown_handle();

    ctrlc::set_handler(move || {
        tracing::info!("Received Ctrl+C, initiating shutdown...");
        shutdown.store(true, Ordering::SeqCst);
    })
    .map_err(|e| scrollkv::ScrollError::Config(format!("cannot install signal handler: {}", e)))?;

    let served = server.run();

    flusher.stop();
    drop(server);

    // run() has joined every connection thread, so nothing can write after
    // this flush
    if engine.is_dirty() {
        tracing::info!("Flushing unsaved changes before exit");
        engine.flush_all()?;
    }

    served
}
