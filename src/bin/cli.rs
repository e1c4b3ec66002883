//! ScrollKV CLI Client
//!
//! Command-line interface for interacting with a ScrollKV server.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;

use clap::{Parser, Subcommand};
use scrollkv::protocol::{read_reply, write_request, Request};
use serde_json::{json, Value};

/// ScrollKV CLI
#[derive(Parser, Debug)]
#[command(name = "scrollkv-cli")]
#[command(about = "CLI for ScrollKV key-value store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:7420")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Count stored keys
    Count,

    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set (parsed as JSON, otherwise stored as a string)
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },
}

impl Commands {
    fn into_request(self) -> Request {
        match self {
            Commands::Count => Request::new(1, "count", json!({})),
            Commands::Get { key } => Request::new(1, "get", json!({ "key": key })),
            Commands::Set { key, value } => {
                let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
                Request::new(1, "set", json!({ "key": key, "value": value }))
            }
            Commands::Del { key } => Request::new(1, "delete", json!({ "key": key })),
        }
    }
}

fn main() {
    let args = Args::parse();
    let request = args.command.into_request();

    match call(&args.server, &request) {
        Ok(reply) => match (reply.response, reply.error) {
            (_, Some(error)) => {
                eprintln!("error: {}", error);
                std::process::exit(1);
            }
            (Some(response), None) => println!("{}", response),
            (None, None) => println!("null"),
        },
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}

fn call(server: &str, request: &Request) -> scrollkv::Result<scrollkv::protocol::Reply> {
    let stream = TcpStream::connect(server)?;
    let mut writer = BufWriter::new(stream.try_clone()?);
    let mut reader = BufReader::new(stream);

    write_request(&mut writer, request)?;
    read_reply(&mut reader)
}
