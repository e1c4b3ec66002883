//! Message definitions

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An inbound request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Caller-chosen correlation id, echoed back in the reply
    #[serde(default)]
    pub id: Value,

    pub method: String,

    #[serde(default)]
    pub params: Value,
}

impl Request {
    pub fn new(id: impl Into<Value>, method: impl Into<String>, params: Value) -> Self {
        Self {
            id: id.into(),
            method: method.into(),
            params,
        }
    }
}

/// The answer to a request: exactly one of `response` or `error` is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    /// The request as received (`null` if it could not be parsed)
    pub request: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Reply {
    /// Create a successful reply
    pub fn ok(request: Value, response: Value) -> Self {
        Self {
            request,
            response: Some(response),
            error: None,
        }
    }

    /// Create an error reply
    pub fn error(request: Value, message: impl Into<String>) -> Self {
        Self {
            request,
            response: None,
            error: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}
