//! Inbound request decoding.
//!
//! Three framings are accepted, grown over successive client generations:
//! the legacy metadata-then-stream framing, a single JSON object, and the
//! per-frame JSON session framing. Each framing is a parser that yields a
//! canonical [`ExecutionRequest`] or a definite [`ProtocolError`]; the
//! single-shot path tries JSON first and falls back to the legacy framing.

use serde_json::{Map, Value};
use thiserror::Error;

use crucible_common::ExecutionRequest;

use crate::connection::Connection;

/// Sentinel frame terminating the legacy source stream.
pub const EOF_SENTINEL: &str = "EOF";

/// A frame that violates the active framing's shape. Reported to the
/// client as an `error` event; never fatal to the process.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid request frame: {0}")]
    Malformed(String),

    #[error("metadata frame must be \"<filename>,<language>\"")]
    Metadata,

    #[error("missing or empty field '{0}'")]
    Field(&'static str),

    #[error("connection closed before source transfer completed")]
    TruncatedSource,
}

/// Decodes a single-shot request from its first frame.
///
/// A frame that parses as a JSON object commits to the JSON framing; all
/// other frames fall back to the legacy framing, whose source lines are
/// pulled from `conn` until the `EOF` sentinel. JSON is deliberately tried
/// first: a metadata line that happens to parse as a JSON object is
/// captured by the JSON framing, matching the behavior deployed clients
/// depend on.
pub async fn decode_single_shot<C: Connection + ?Sized>(
    first_frame: &str,
    conn: &mut C,
) -> Result<ExecutionRequest, ProtocolError> {
    match serde_json::from_str::<Value>(first_frame) {
        Ok(Value::Object(fields)) => single_json_request(&fields),
        _ => {
            let (filename, language) = parse_metadata(first_frame)?;
            let content = read_source_lines(conn).await?;
            Ok(ExecutionRequest::File {
                filename,
                language,
                content,
                working_dir: None,
            })
        }
    }
}

/// Decodes one frame of the session framing. Every frame is a standalone
/// JSON object: `"type": "command"` carries a raw shell command, anything
/// else is a file-execution request (language defaults when omitted).
pub fn decode_session_frame(
    frame: &str,
    default_language: &str,
) -> Result<ExecutionRequest, ProtocolError> {
    let value: Value =
        serde_json::from_str(frame).map_err(|e| ProtocolError::Malformed(e.to_string()))?;
    let Value::Object(fields) = value else {
        return Err(ProtocolError::Malformed("expected a JSON object".to_string()));
    };

    if fields.get("type").and_then(Value::as_str) == Some("command") {
        Ok(ExecutionRequest::Command {
            command: required_str(&fields, "command")?,
            working_dir: optional_str(&fields, "workingDir"),
        })
    } else {
        let language = optional_str(&fields, "language")
            .unwrap_or_else(|| default_language.to_string());
        Ok(ExecutionRequest::File {
            filename: required_str(&fields, "filename")?,
            language,
            content: present_str(&fields, "content")?,
            working_dir: optional_str(&fields, "workingDir"),
        })
    }
}

fn single_json_request(fields: &Map<String, Value>) -> Result<ExecutionRequest, ProtocolError> {
    Ok(ExecutionRequest::File {
        filename: required_str(fields, "filename")?,
        language: required_str(fields, "language")?,
        content: required_str(fields, "content")?,
        working_dir: None,
    })
}

/// `"<filename>,<language>"`, exactly one comma.
fn parse_metadata(frame: &str) -> Result<(String, String), ProtocolError> {
    let mut parts = frame.split(',');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(filename), Some(language), None) if !language.is_empty() => {
            Ok((filename.to_string(), language.to_string()))
        }
        _ => Err(ProtocolError::Metadata),
    }
}

/// Collects raw source frames until the sentinel, appending a newline to
/// each so the reassembled content matches what the client streamed.
async fn read_source_lines<C: Connection + ?Sized>(
    conn: &mut C,
) -> Result<String, ProtocolError> {
    let mut content = String::new();
    loop {
        match conn.recv().await {
            Some(frame) if frame == EOF_SENTINEL => return Ok(content),
            Some(frame) => {
                content.push_str(&frame);
                content.push('\n');
            }
            None => return Err(ProtocolError::TruncatedSource),
        }
    }
}

fn required_str(fields: &Map<String, Value>, key: &'static str) -> Result<String, ProtocolError> {
    match fields.get(key).and_then(Value::as_str) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(ProtocolError::Field(key)),
    }
}

/// Like [`required_str`] but accepts an empty value; the key itself must
/// still be present.
fn present_str(fields: &Map<String, Value>, key: &'static str) -> Result<String, ProtocolError> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(ProtocolError::Field(key))
}

fn optional_str(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
