//! Typed extraction helpers for walking backend `json` documents.

use serde_json::{Map, Value};

use crate::error::{Error, ErrorKind, Result};

pub(crate) fn invalid_reply(description: String) -> Error {
    Error::new(ErrorKind::Unclassified, description)
}

fn missing_field(key: &str) -> Error {
    invalid_reply(format!(
        "Server reply invalid: required \"{key}\" missing in object"
    ))
}

/// Parses a raw body and requires the root to be an object.
pub(crate) fn parse_object(raw: &str) -> Result<Map<String, Value>> {
    let root: Value = serde_json::from_str(raw)
        .map_err(|e| invalid_reply(format!("Error parsing json: {e}")))?;

    match root {
        Value::Object(object) => Ok(object),
        _ => Err(invalid_reply(
            "Server reply invalid: json root is not an object".into(),
        )),
    }
}

/// Extracts a required string field; the error names the missing field.
pub(crate) fn required_str(object: &Map<String, Value>, key: &str) -> Result<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| missing_field(key))
}

/// Extracts a required non-negative integer field.
pub(crate) fn required_u64(object: &Map<String, Value>, key: &str) -> Result<u64> {
    object
        .get(key)
        .and_then(Value::as_u64)
        .ok_or_else(|| missing_field(key))
}

/// Extracts a required object field.
pub(crate) fn required_object<'a>(
    object: &'a Map<String, Value>,
    key: &str,
) -> Result<&'a Map<String, Value>> {
    object.get(key).and_then(Value::as_object).ok_or_else(|| {
        invalid_reply(format!(
            "Server reply invalid: \"{key}\" was not an object"
        ))
    })
}
