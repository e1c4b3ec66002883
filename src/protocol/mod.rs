//! Protocol Module
//!
//! Request/reply messages exchanged between clients and the engine host.
//!
//! ## Framing
//! One JSON document per line, in both directions.
//!
//! ### Request
//! ```text
//! {"id": 7, "method": "set", "params": {"key": "a", "value": 1}}
//! ```
//!
//! ### Reply
//! ```text
//! {"request": {...}, "response": {"a": 1}}
//! {"request": {...}, "error": "Unknown method: frob"}
//! ```
//!
//! ### Methods
//! - count:  no params          → number of keys
//! - get:    {key}              → value or null
//! - set:    {key, value}       → {key: value}
//! - delete: {key}              → true

mod command;
mod message;
mod codec;
mod dispatch;

pub use command::{Command, Method};
pub use message::{Reply, Request};
pub use codec::{
    parse_request, read_line, read_line_with_limit, read_reply, write_reply, write_request,
    MAX_LINE_BYTES,
};
pub use dispatch::dispatch_line;
