//! Command definitions
//!
//! Validated engine calls built from inbound requests.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::{Result, ScrollError};

use super::Request;

/// Methods a host may dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Count,
    Get,
    Set,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Count => "count",
            Method::Get => "get",
            Method::Set => "set",
            Method::Delete => "delete",
        }
    }
}

impl FromStr for Method {
    type Err = ScrollError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "count" => Ok(Method::Count),
            "get" => Ok(Method::Get),
            "set" => Ok(Method::Set),
            "delete" => Ok(Method::Delete),
            other => Err(ScrollError::UnknownMethod(other.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed command
///
/// Keys are carried as raw JSON; the engine normalizes them.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Count live keys
    Count,

    /// Get a value by key
    Get { key: Value },

    /// Store a value under a key
    Set { key: Value, value: Value },

    /// Delete a key
    Delete { key: Value },
}

impl Command {
    /// Get the command's method
    pub fn method(&self) -> Method {
        match self {
            Command::Count => Method::Count,
            Command::Get { .. } => Method::Get,
            Command::Set { .. } => Method::Set,
            Command::Delete { .. } => Method::Delete,
        }
    }

    /// Validate a request's method and params
    pub fn from_request(request: &Request) -> Result<Self> {
        let method: Method = request.method.parse()?;
        match method {
            Method::Count => Ok(Command::Count),
            Method::Get => Ok(Command::Get {
                key: required_param(request, "key")?,
            }),
            Method::Set => Ok(Command::Set {
                key: required_param(request, "key")?,
                value: required_param(request, "value")?,
            }),
            Method::Delete => Ok(Command::Delete {
                key: required_param(request, "key")?,
            }),
        }
    }
}

fn required_param(request: &Request, name: &str) -> Result<Value> {
    let params = request.params.as_object().ok_or_else(|| {
        ScrollError::InvalidRequest(format!("{} expects an object of params", request.method))
    })?;

    params.get(name).cloned().ok_or_else(|| {
        ScrollError::InvalidRequest(format!("{} is missing param {:?}", request.method, name))
    })
}
