//! Strict decoding of model output.
//!
//! Every function here returns a `Result`; callers own the fallback branch.
//! Nothing in this module invents data.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("model returned no content")]
    Empty,

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON {expected}, found {found}")]
    Shape {
        expected: &'static str,
        found: &'static str,
    },
}

/// Output shape a prompt asked the model for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    JsonObject,
    JsonArray,
    PlainText,
}

/// Remove surrounding whitespace and a single Markdown code fence, if any.
pub fn strip_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(inner) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Skip the info string (`json`, `JSON`, ...) on the opening line.
    match inner.find('\n') {
        Some(newline) => inner[newline + 1..].trim(),
        None => strip_inline_info(inner.trim()),
    }
}

/// One-line fences (```` ```json {...}``` ````) carry the info word inline.
fn strip_inline_info(inner: &str) -> &str {
    match inner.find(|c: char| !c.is_ascii_alphabetic()) {
        Some(end) if end > 0 && inner[end..].starts_with(char::is_whitespace) => inner[end..].trim(),
        _ => inner,
    }
}

pub fn decode_value(text: &str) -> Result<Value, ParseError> {
    let body = strip_fence(text);
    if body.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(serde_json::from_str(body)?)
}

pub fn decode_object(text: &str) -> Result<Map<String, Value>, ParseError> {
    match decode_value(text)? {
        Value::Object(map) => Ok(map),
        other => Err(ParseError::Shape {
            expected: "object",
            found: type_name(&other),
        }),
    }
}

pub fn decode_array(text: &str) -> Result<Vec<Value>, ParseError> {
    match decode_value(text)? {
        Value::Array(items) => Ok(items),
        other => Err(ParseError::Shape {
            expected: "array",
            found: type_name(&other),
        }),
    }
}

/// Decode straight into a typed value.
pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T, ParseError> {
    let body = strip_fence(text);
    if body.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(serde_json::from_str(body)?)
}

/// Free-text deliverables need no decoding.
pub fn plain_text(text: &str) -> String {
    text.trim().to_string()
}

/// Check `text` against the requested shape without keeping the result.
pub fn conforms(text: &str, shape: Shape) -> bool {
    match shape {
        Shape::JsonObject => decode_object(text).is_ok(),
        Shape::JsonArray => decode_array(text).is_ok(),
        Shape::PlainText => !text.trim().is_empty(),
    }
}

pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
