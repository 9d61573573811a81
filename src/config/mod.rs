//! Configuration for the request logger

pub mod settings;

pub use settings::{LoggerSettings, Severity};
