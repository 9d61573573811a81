//! Bounded collection of header and parameter fields

use serde_json::Value;
use std::borrow::Borrow;
use std::collections::{BTreeMap, HashSet};

use super::sanitize::sanitize;

/// Number of leading pairs kept from a header or parameter list
pub const MAX_COLLECTED_FIELDS: usize = 20;

/// Sanitized key/value mapping written into a record.
///
/// Sorted by key so the serialized record is deterministic.
pub type FieldCollection = BTreeMap<String, Value>;

/// Sanitize the first [`MAX_COLLECTED_FIELDS`] pairs into a flat mapping.
///
/// Pairs are merged in input order, so a repeated key keeps the value of its
/// last occurrence among the retained pairs. Anything past the limit is
/// dropped without inspection.
pub fn collect<I, K, V>(pairs: I, denylist: &HashSet<String>) -> FieldCollection
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Borrow<Value>,
{
    pairs
        .into_iter()
        .take(MAX_COLLECTED_FIELDS)
        .map(|(key, value)| sanitize(key.as_ref(), value.borrow(), denylist))
        .fold(FieldCollection::new(), |mut fields, field| {
            fields.insert(field.key, field.value);
            fields
        })
}

/// Text form of a collected value, if the key is present
pub fn text(fields: &FieldCollection, key: &str) -> Option<String> {
    fields.get(key).map(|value| match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}
