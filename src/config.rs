//! Configuration for ScrollKV
//!
//! Centralized configuration with sensible defaults, overridable from the
//! process environment.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, ScrollError};

/// Environment variable names read by [`Config::from_env`]
pub mod env {
    pub const DATA_DIR: &str = "SCROLLKV_DATA_DIR";
    pub const SEGMENT: &str = "SCROLLKV_SEGMENT";
    pub const FLUSH_INTERVAL_MS: &str = "SCROLLKV_FLUSH_INTERVAL_MS";
    pub const GATE_TIMEOUT_MS: &str = "SCROLLKV_GATE_TIMEOUT_MS";
    pub const LISTEN_ADDR: &str = "SCROLLKV_LISTEN_ADDR";
    pub const MAX_CONNECTIONS: &str = "SCROLLKV_MAX_CONNECTIONS";
}

/// Main configuration for a ScrollKV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Storage directory. Every regular file in it is read as a log segment
    /// on startup; flushes write only the active segment:
    ///   {data_dir}/
    ///     └── store.log        (active segment)
    pub data_dir: PathBuf,

    /// File name of the active log segment inside `data_dir`
    pub segment_name: String,

    // -------------------------------------------------------------------------
    // Flush Configuration
    // -------------------------------------------------------------------------
    /// How often the background flusher checks the dirty flag (milliseconds)
    pub flush_interval_ms: u64,

    /// Longest an operation waits for the readiness gate before failing with
    /// `FlushTimeout`. `None` waits indefinitely.
    pub gate_timeout_ms: Option<u64>,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./scrollkv_data"),
            segment_name: "store.log".to_string(),
            flush_interval_ms: 1000,
            gate_timeout_ms: Some(30_000),
            listen_addr: "127.0.0.1:7420".to_string(),
            max_connections: 1024,
            read_timeout_ms: 0,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Defaults overlaid with any `SCROLLKV_*` variables set in the process
    /// environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each variable name
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(dir) = lookup(env::DATA_DIR) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(name) = lookup(env::SEGMENT) {
            config.segment_name = name;
        }
        if let Some(raw) = lookup(env::FLUSH_INTERVAL_MS) {
            config.flush_interval_ms = parse_var(env::FLUSH_INTERVAL_MS, &raw)?;
        }
        if let Some(raw) = lookup(env::GATE_TIMEOUT_MS) {
            let ms: u64 = parse_var(env::GATE_TIMEOUT_MS, &raw)?;
            config.gate_timeout_ms = (ms > 0).then_some(ms);
        }
        if let Some(addr) = lookup(env::LISTEN_ADDR) {
            config.listen_addr = addr;
        }
        if let Some(raw) = lookup(env::MAX_CONNECTIONS) {
            config.max_connections = parse_var(env::MAX_CONNECTIONS, &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.segment_name.is_empty() {
            return Err(ScrollError::Config("segment name must not be empty".to_string()));
        }
        if Path::new(&self.segment_name).file_name().map(|n| n.len())
            != Some(self.segment_name.len())
        {
            return Err(ScrollError::Config(format!(
                "segment name must be a bare file name, got {:?}",
                self.segment_name
            )));
        }
        if self.flush_interval_ms == 0 {
            return Err(ScrollError::Config("flush interval must be positive".to_string()));
        }
        Ok(())
    }

    /// Path of the active log segment
    pub fn segment_path(&self) -> PathBuf {
        self.data_dir.join(&self.segment_name)
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn gate_timeout(&self) -> Option<Duration> {
        self.gate_timeout_ms.map(Duration::from_millis)
    }
}

fn parse_var<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| ScrollError::Config(format!("{} has an invalid value: {:?}", name, raw)))
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all log segments)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the active segment's file name
    pub fn segment_name(mut self, name: impl Into<String>) -> Self {
        self.config.segment_name = name.into();
        self
    }

    /// Set the flusher's polling interval (in milliseconds)
    pub fn flush_interval_ms(mut self, ms: u64) -> Self {
        self.config.flush_interval_ms = ms;
        self
    }

    /// Set the readiness gate wait limit (`None` = wait forever)
    pub fn gate_timeout_ms(mut self, ms: Option<u64>) -> Self {
        self.config.gate_timeout_ms = ms;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
