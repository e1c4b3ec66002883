//! Request dispatch
//!
//! Turns one inbound line into one reply by way of the engine.

use serde_json::Value;

use crate::engine::Engine;
use crate::error::ScrollError;

use super::{parse_request, Command, Reply};

/// Handle a single request line
///
/// Every failure becomes an error reply; nothing here ends the connection.
pub fn dispatch_line(engine: &Engine, line: &str) -> Reply {
    let request = match parse_request(line) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!("Rejected request line: {}", e);
            return Reply::error(Value::Null, e.to_string());
        }
    };

    let echoed = serde_json::to_value(&request).unwrap_or(Value::Null);

    let result = Command::from_request(&request).and_then(|command| {
        tracing::trace!("Dispatching {} (id {})", command.method(), request.id);
        engine.execute(command)
    });

    match result {
        Ok(response) => Reply::ok(echoed, response),
        Err(e) => {
            match &e {
                ScrollError::UnknownMethod(_)
                | ScrollError::InvalidRequest(_)
                | ScrollError::InvalidKey(_) => {
                    tracing::debug!("Request {} rejected: {}", request.id, e)
                }
                _ => tracing::warn!("Request {} failed: {}", request.id, e),
            }
            Reply::error(echoed, e.to_string())
        }
    }
}
