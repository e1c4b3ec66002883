//! Protocol codec
//!
//! Line framing for requests and replies.

use std::io::{BufRead, Read, Write};

use serde_json::Value;

use crate::error::{Result, ScrollError};

use super::{Reply, Request};

/// Parse one line into a request
///
/// Malformed JSON and JSON of the wrong shape are both `InvalidRequest`.
pub fn parse_request(line: &str) -> Result<Request> {
    let raw: Value = serde_json::from_str(line)
        .map_err(|e| ScrollError::InvalidRequest(format!("malformed JSON: {}", e)))?;
    serde_json::from_value(raw)
        .map_err(|e| ScrollError::InvalidRequest(format!("not a request: {}", e)))
}

/// Longest request or reply line accepted, terminator excluded
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Read the next line, without its terminator
///
/// Returns `None` at end of stream. See [`read_line_with_limit`].
pub fn read_line<R: BufRead>(reader: &mut R) -> Result<Option<String>> {
    read_line_with_limit(reader, MAX_LINE_BYTES)
}

/// Read the next line of at most `max_bytes`, without its terminator
///
/// A line that is not UTF-8 or is longer than `max_bytes` fails with
/// `InvalidRequest`; in both cases the whole line is consumed, so the next
/// call starts at the following line.
pub fn read_line_with_limit<R: BufRead>(reader: &mut R, max_bytes: usize) -> Result<Option<String>> {
    let mut buf = Vec::new();
    // One extra byte leaves room for the terminator of a line of exactly max_bytes
    let read = reader
        .by_ref()
        .take(max_bytes as u64 + 1)
        .read_until(b'\n', &mut buf)?;
    if read == 0 {
        return Ok(None);
    }

    let terminated = buf.last() == Some(&b'\n');
    if !terminated && buf.len() > max_bytes {
        skip_past_newline(reader)?;
        return Err(ScrollError::InvalidRequest(format!(
            "line exceeds {} bytes",
            max_bytes
        )));
    }

    while matches!(buf.last(), Some(b'\n') | Some(b'\r')) {
        buf.pop();
    }
    String::from_utf8(buf)
        .map(Some)
        .map_err(|_| ScrollError::InvalidRequest("line is not valid UTF-8".to_string()))
}

/// Discard input up to and including the next newline, without buffering it
fn skip_past_newline<R: BufRead>(reader: &mut R) -> Result<()> {
    loop {
        let available = reader.fill_buf()?;
        if available.is_empty() {
            return Ok(());
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                reader.consume(pos + 1);
                return Ok(());
            }
            None => {
                let len = available.len();
                reader.consume(len);
            }
        }
    }
}

/// Write a request to a stream
pub fn write_request<W: Write>(writer: &mut W, request: &Request) -> Result<()> {
    write_json_line(writer, request)
}

/// Write a reply to a stream
pub fn write_reply<W: Write>(writer: &mut W, reply: &Reply) -> Result<()> {
    write_json_line(writer, reply)
}

/// Read a reply from a stream
pub fn read_reply<R: BufRead>(reader: &mut R) -> Result<Reply> {
    let line = read_line(reader)?.ok_or_else(|| {
        ScrollError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection closed before reply",
        ))
    })?;
    Ok(serde_json::from_str(&line)?)
}

fn write_json_line<W: Write, T: serde::Serialize>(writer: &mut W, message: &T) -> Result<()> {
    let mut bytes = serde_json::to_vec(message)?;
    bytes.push(b'\n');
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
