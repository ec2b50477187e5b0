use crate::{
    error::*,
    flags::{SerializeFlags, DEFAULT_MAX_DEPTH},
    ser::walker::Walker,
    value::{document::Document, graph::Value},
};
use tracing::warn;

pub fn to_string(value: &Value) -> Result<String> {
    to_string_with(value, SerializeFlags::empty(), DEFAULT_MAX_DEPTH)
}

pub fn to_string_pretty(value: &Value) -> Result<String> {
    to_string_with(value, SerializeFlags::PRETTY_PRINT, DEFAULT_MAX_DEPTH)
}

pub fn to_string_with(value: &Value, flags: SerializeFlags, max_depth: usize) -> Result<String> {
    let document = Walker::new(flags).max_depth(max_depth).walk(value)?;
    encode(document, flags)
}

/// Serializes an object leaving out `skip_fields` of the root object.
pub fn object_to_string(
    value: &Value,
    skip_fields: &[&str],
    flags: SerializeFlags,
    max_depth: usize,
) -> Result<String> {
    if value.as_object().is_none() {
        return Err(Error::InvalidArgument(format!(
            "expected object, found {}",
            value.kind()
        )));
    }
    let document = Walker::new(flags)
        .skip_fields(skip_fields)
        .max_depth(max_depth)
        .walk(value)?;
    encode(document, flags)
}

/// Writes document as JSON text. Unless `SKIP_SANITIZE` is set, a failed
/// write is retried once with invalid UTF-8 text repaired.
pub fn encode(document: Document, flags: SerializeFlags) -> Result<String> {
    match write(&document, flags) {
        Ok(result) => Ok(result),
        Err(error) if !flags.contains(SerializeFlags::SKIP_SANITIZE) => {
            warn!("encoding failed, retrying with sanitized text: {}", error);
            write(&document.sanitized(), flags)
                .map_err(|error| Error::EncodingFailure(error.to_string()))
        }
        Err(error) => Err(Error::EncodingFailure(error.to_string())),
    }
}

fn write(document: &Document, flags: SerializeFlags) -> serde_json::Result<String> {
    if flags.contains(SerializeFlags::PRETTY_PRINT) {
        serde_json::to_string_pretty(document)
    } else {
        serde_json::to_string(document)
    }
}
