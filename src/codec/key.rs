//! Key normalization

use serde_json::Value;

use crate::error::{Result, ScrollError};

use super::{KEY_VALUE_DELIMITER, RECORD_DELIMITER};

/// Convert an API key into its canonical string form
///
/// Strings are kept as-is and numbers use their JSON text (`42` → `"42"`).
/// Any other JSON type, an empty key, or a key containing a delimiter is
/// rejected before any state is touched.
pub fn normalize_key(raw: &Value) -> Result<String> {
    let key = match raw {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => {
            return Err(ScrollError::InvalidKey(format!(
                "expected a string or number, got {}",
                json_type(other)
            )))
        }
    };

    if key.is_empty() {
        return Err(ScrollError::InvalidKey("key is empty".to_string()));
    }
    if key.contains(KEY_VALUE_DELIMITER) || key.contains(RECORD_DELIMITER) {
        return Err(ScrollError::InvalidKey(format!(
            "{:?} contains a reserved delimiter",
            key
        )));
    }

    Ok(key)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
