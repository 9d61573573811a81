//! Construction of sanitized request records

pub mod builder;
pub mod collector;
pub mod sanitize;

pub use builder::{ExtraAttributes, RecordBuilder};
pub use collector::{collect, FieldCollection, MAX_COLLECTED_FIELDS};
pub use sanitize::{sanitize, SanitizedField, FILTERED_MARKER, MAX_VALUE_CHARS};
