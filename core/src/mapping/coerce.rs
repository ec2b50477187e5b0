//! Scalar coercions applied to mapped document values.

use crate::{error::*, value::document::Document};

pub fn to_bool(value: &Document) -> bool {
    match value {
        Document::Null => false,
        Document::Bool(v) => *v,
        Document::Int(v) => *v != 0,
        Document::Float(v) => *v != 0.0,
        Document::String(v) => !v.is_empty() && v != "0",
        Document::Bytes(v) => !v.is_empty() && v.as_slice() != b"0",
        Document::Sequence(v) => !v.is_empty(),
        Document::Record(v) => !v.is_empty(),
    }
}

pub fn to_int(value: &Document) -> i64 {
    match value {
        Document::Null => 0,
        Document::Bool(v) => *v as i64,
        Document::Int(v) => *v,
        // saturating, NaN becomes 0
        Document::Float(v) => *v as i64,
        Document::String(v) => parse_int(v),
        Document::Bytes(v) => parse_int(&String::from_utf8_lossy(v)),
        Document::Sequence(v) => !v.is_empty() as i64,
        Document::Record(v) => !v.is_empty() as i64,
    }
}

pub fn to_float(value: &Document) -> f64 {
    match value {
        Document::Null => 0.0,
        Document::Bool(v) => *v as i64 as f64,
        Document::Int(v) => *v as f64,
        Document::Float(v) => *v,
        Document::String(v) => parse_float(v),
        Document::Bytes(v) => parse_float(&String::from_utf8_lossy(v)),
        Document::Sequence(v) => !v.is_empty() as i64 as f64,
        Document::Record(v) => !v.is_empty() as i64 as f64,
    }
}

pub fn to_string(value: &Document) -> Result<String> {
    match value {
        Document::Null => Ok(String::new()),
        Document::Bool(true) => Ok("1".to_owned()),
        Document::Bool(false) => Ok(String::new()),
        Document::Int(v) => Ok(v.to_string()),
        Document::Float(v) => Ok(v.to_string()),
        Document::String(v) => Ok(v.to_owned()),
        Document::Bytes(v) => Ok(String::from_utf8_lossy(v).into_owned()),
        value => Err(Error::mismatch("string convertible value", value.kind())),
    }
}

fn parse_int(text: &str) -> i64 {
    let prefix = numeric_prefix(text);
    prefix
        .parse::<i64>()
        .or_else(|_| prefix.parse::<f64>().map(|v| v as i64))
        .unwrap_or_default()
}

fn parse_float(text: &str) -> f64 {
    numeric_prefix(text).parse().unwrap_or_default()
}

/// Longest leading part of `text` that reads as a decimal number,
/// ignoring leading whitespace.
fn numeric_prefix(text: &str) -> &str {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let digits = |from: usize| {
        bytes[from..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let integral = digits(end);
    end += integral;
    let mut fraction = 0;
    if bytes.get(end) == Some(&b'.') {
        fraction = digits(end + 1);
        if integral > 0 || fraction > 0 {
            end += 1 + fraction;
        }
    }
    if integral == 0 && fraction == 0 {
        return "";
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent = end + 1;
        if matches!(bytes.get(exponent), Some(b'+' | b'-')) {
            exponent += 1;
        }
        let count = digits(exponent);
        if count > 0 {
            end = exponent + count;
        }
    }
    &text[..end]
}
