//! Tests for the TCP host
//!
//! These tests verify:
//! - Requests over a socket reach the engine
//! - Malformed lines get an error reply without closing the connection
//! - The connection limit is enforced
//! - Shutdown stops the accept loop and closes open connections

use std::io::{BufReader, BufWriter, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use scrollkv::config::Config;
use scrollkv::network::Server;
use scrollkv::protocol::{read_line, read_reply, write_request, Reply, Request};
use scrollkv::Engine;
use serde_json::{json, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

struct Harness {
    _temp: TempDir,
    engine: Arc<Engine>,
    server: Arc<Server>,
    runner: Option<JoinHandle<()>>,
}

impl Harness {
    fn start(max_connections: usize) -> Self {
        let temp = TempDir::new().unwrap();
        let config = Config::builder()
            .data_dir(temp.path())
            .listen_addr("127.0.0.1:0")
            .max_connections(max_connections)
            .build();
        let engine = Arc::new(Engine::open(config.clone()).unwrap());
        let server = Arc::new(Server::bind(config, Arc::clone(&engine)).unwrap());

        let runner = {
            let server = Arc::clone(&server);
            thread::spawn(move || server.run().unwrap())
        };

        Self {
            _temp: temp,
            engine,
            server,
            runner: Some(runner),
        }
    }

    fn connect(&self) -> Client {
        let stream = TcpStream::connect(self.server.local_addr().unwrap()).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        Client {
            writer: BufWriter::new(stream.try_clone().unwrap()),
            reader: BufReader::new(stream),
        }
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.server.shutdown();
        if let Some(runner) = self.runner.take() {
            let _ = runner.join();
        }
    }
}

struct Client {
    writer: BufWriter<TcpStream>,
    reader: BufReader<TcpStream>,
}

impl Client {
    fn call(&mut self, method: &str, params: Value) -> Reply {
        write_request(&mut self.writer, &Request::new(1, method, params)).unwrap();
        read_reply(&mut self.reader).unwrap()
    }

    fn send_raw(&mut self, line: &str) -> Reply {
        self.send_bytes(line.as_bytes())
    }

    fn send_bytes(&mut self, line: &[u8]) -> Reply {
        self.writer.write_all(line).unwrap();
        self.writer.write_all(b"\n").unwrap();
        self.writer.flush().unwrap();
        read_reply(&mut self.reader).unwrap()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn test_server_serves_requests() {
    let harness = Harness::start(16);
    let mut client = harness.connect();

    let reply = client.call("set", json!({"key": "a", "value": {"n": 1}}));
    assert_eq!(reply.response, Some(json!({"a": {"n": 1}})));

    let reply = client.call("get", json!({"key": "a"}));
    assert_eq!(reply.response, Some(json!({"n": 1})));

    let reply = client.call("count", json!({}));
    assert_eq!(reply.response, Some(json!(1)));

    assert_eq!(harness.engine.count().unwrap(), 1);
}

#[test]
fn test_server_keeps_connection_after_bad_line() {
    let harness = Harness::start(16);
    let mut client = harness.connect();

    let reply = client.send_raw("this is not json");
    assert!(reply.error.is_some());

    let reply = client.call("unknown", json!({}));
    assert_eq!(reply.error, Some("Unknown method: unknown".to_string()));

    let reply = client.call("count", json!({}));
    assert_eq!(reply.response, Some(json!(0)));
}

#[test]
fn test_server_multiple_clients_share_engine() {
    let harness = Harness::start(16);
    let mut first = harness.connect();
    let mut second = harness.connect();

    first.call("set", json!({"key": 7, "value": "seven"}));
    let reply = second.call("get", json!({"key": "7"}));

    assert_eq!(reply.response, Some(json!("seven")));
}

#[test]
fn test_server_rejects_over_limit() {
    let harness = Harness::start(0);
    let stream = TcpStream::connect(harness.server.local_addr().unwrap()).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();

    let reply = read_reply(&mut BufReader::new(stream)).unwrap();

    assert_eq!(reply.error, Some("too many connections".to_string()));
}

#[test]
fn test_server_shutdown_stops_run() {
    let mut harness = Harness::start(16);

    harness.server.shutdown();
    let runner = harness.runner.take().unwrap();

    runner.join().unwrap();
}

#[test]
fn test_server_answers_non_utf8_line_and_keeps_serving() {
    let harness = Harness::start(16);
    let mut client = harness.connect();

    let reply = client.send_bytes(&[0xff, 0xfe, b'{']);
    let error = reply.error.unwrap();
    assert!(error.starts_with("Invalid request"), "got {}", error);

    let reply = client.call("set", json!({"key": "k", "value": 1}));
    assert_eq!(reply.response, Some(json!({"k": 1})));
}

#[test]
fn test_server_shutdown_closes_open_connections() {
    let mut harness = Harness::start(16);
    let mut client = harness.connect();

    client.call("set", json!({"key": "kept", "value": true}));
    assert_eq!(harness.server.active_connections(), 1);

    // The client stays connected; run() must still close it and return
    harness.server.shutdown();
    harness.runner.take().unwrap().join().unwrap();

    assert_eq!(harness.server.active_connections(), 0);
    assert_eq!(read_line(&mut client.reader).unwrap(), None);
    assert_eq!(harness.engine.count().unwrap(), 1);
}

#[test]
fn test_server_counts_active_connections() {
    let harness = Harness::start(16);
    let mut first = harness.connect();
    let mut second = harness.connect();

    // A reply proves the connection thread is running
    first.call("count", json!({}));
    second.call("count", json!({}));
    assert_eq!(harness.server.active_connections(), 2);

    drop(first);
    let deadline = Instant::now() + Duration::from_secs(5);
    while harness.server.active_connections() != 1 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(harness.server.active_connections(), 1);
}
