//! Codec Module
//!
//! Text encoding of records for the on-disk log.
//!
//! ## Responsibilities
//! - Normalize API keys into their canonical string form
//! - Encode a record sequence into log text
//! - Decode log text back into records (best effort, never fails)
//!
//! ## Log Format
//! ```text
//! \n<key>:<json value>\n<key>:<json value>...
//! ```
//! Every record is prefixed by `RECORD_DELIMITER`; the key ends at the first
//! `KEY_VALUE_DELIMITER`. There is no header, checksum, or version: keys must
//! never contain either delimiter, and serialized JSON never contains a raw
//! newline.

mod key;
mod record;

pub use key::normalize_key;
pub use record::{Record, StoredValue};

/// Prefix written before every record
pub const RECORD_DELIMITER: char = '\n';

/// Separates a record's key from its serialized value
pub const KEY_VALUE_DELIMITER: char = ':';

/// Encode records into log text
///
/// Empty input encodes to an empty string.
pub fn encode(records: &[Record]) -> String {
    let mut text = String::new();
    for record in records {
        text.push(RECORD_DELIMITER);
        text.push_str(&record.key);
        text.push(KEY_VALUE_DELIMITER);
        text.push_str(&record.value.to_log_text());
    }
    text
}

/// Decode log text into records
///
/// Fragments with no key/value delimiter, an empty key, or an empty value are
/// dropped. This discards the empty fragment before the leading delimiter.
pub fn decode(text: &str) -> Vec<Record> {
    text.split(RECORD_DELIMITER)
        .filter_map(decode_fragment)
        .collect()
}

fn decode_fragment(fragment: &str) -> Option<Record> {
    let (key, raw_value) = fragment.split_once(KEY_VALUE_DELIMITER)?;
    if key.is_empty() || raw_value.is_empty() {
        return None;
    }
    Some(Record::new(key, StoredValue::from_log_text(raw_value)))
}
