//! Field sanitization for request records.
//!
//! Redacts denylisted keys and truncates long text values before they are
//! written to the request log.

use serde_json::Value;
use std::collections::HashSet;

/// Marker that replaces the value of a denylisted key.
pub const FILTERED_MARKER: &str = "[FILTERED]";

/// Maximum number of characters kept from a text value.
pub const MAX_VALUE_CHARS: usize = 101;

/// A key/value pair after redaction and truncation.
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedField {
    pub key: String,
    pub value: Value,
}

/// Sanitize a single key/value pair.
///
/// Keys are matched against `denylist` exactly as received. Text values are
/// cut to their first [`MAX_VALUE_CHARS`] characters; every other JSON value
/// passes through untouched.
pub fn sanitize(key: &str, value: &Value, denylist: &HashSet<String>) -> SanitizedField {
    let value = if denylist.contains(key) {
        Value::String(FILTERED_MARKER.to_string())
    } else {
        match value {
            Value::String(text) => Value::String(truncate(text)),
            other => other.clone(),
        }
    };

    SanitizedField {
        key: key.to_string(),
        value,
    }
}

/// Keep the first [`MAX_VALUE_CHARS`] characters of `text`.
fn truncate(text: &str) -> String {
    match text.char_indices().nth(MAX_VALUE_CHARS) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}
