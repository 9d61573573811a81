//! Request Log Interceptor - structured, sanitized request logging for HTTP pipelines
//!
//! This library turns every request/response exchange into one JSON record,
//! redacting denylisted fields and truncating oversized values, and emits it
//! once the response is final.

pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod record;
pub mod server;
pub mod utils;

// Re-export commonly used items
pub use config::{LoggerSettings, Severity};
pub use error::{Error, Result};
pub use logging::{init_logger, init_logger_with_config, init_logger_with_env, Emitter, LogSink};
pub use models::{ErrorRecord, LogRecord};
pub use pipeline::{ConnectionState, Exchange, RequestLogger, RouteInfo};
pub use record::RecordBuilder;
pub use server::{serve, LoggedService};
