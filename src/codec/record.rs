//! Record and value definitions

use serde::Serialize;
use serde_json::Value;

/// A value as held by the store
///
/// Values written through the API are `Structured`. A log fragment that is
/// not valid JSON survives recovery only as `Raw` text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StoredValue {
    /// A JSON value
    Structured(Value),

    /// Text that could not be parsed as JSON
    Raw(String),
}

impl StoredValue {
    /// Serialize for the log, falling back to display text
    pub fn to_log_text(&self) -> String {
        match self {
            StoredValue::Structured(value) => {
                serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
            }
            StoredValue::Raw(text) => text.clone(),
        }
    }

    /// Parse a log fragment, keeping it verbatim when it is not JSON
    pub fn from_log_text(text: &str) -> Self {
        match serde_json::from_str(text) {
            Ok(value) => StoredValue::Structured(value),
            Err(_) => StoredValue::Raw(text.to_string()),
        }
    }

    /// Collapse into a JSON value (`Raw` becomes a JSON string)
    pub fn to_json(&self) -> Value {
        match self {
            StoredValue::Structured(value) => value.clone(),
            StoredValue::Raw(text) => Value::String(text.clone()),
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, StoredValue::Raw(_))
    }
}

impl From<Value> for StoredValue {
    fn from(value: Value) -> Self {
        StoredValue::Structured(value)
    }
}

/// A single key/value pair
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Normalized key
    pub key: String,

    pub value: StoredValue,
}

impl Record {
    pub fn new(key: impl Into<String>, value: impl Into<StoredValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// The `{key: value}` object returned to callers of `set`
    pub fn to_json(&self) -> Value {
        let mut object = serde_json::Map::with_capacity(1);
        object.insert(self.key.clone(), self.value.to_json());
        Value::Object(object)
    }
}
