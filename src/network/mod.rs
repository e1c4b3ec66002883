//! Network Module
//!
//! TCP host that feeds requests to the engine.
//!
//! ## Architecture
//! - Single acceptor thread polling a shutdown flag
//! - One thread per connection, capped by `max_connections`
//! - Requests dispatched through `protocol::dispatch_line`

mod server;
mod connection;

pub use server::Server;
pub use connection::Connection;
