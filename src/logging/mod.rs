use log::{error, info, LevelFilter};
use std::sync::Once;
use tracing::Level;
use tracing_log::LogTracer;
use tracing_subscriber::fmt::SubscriberBuilder;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::Severity;

pub mod emitter;

pub use emitter::{Emitter, LogCrateSink, LogSink, MemorySink, RECORD_TARGET};

static INIT: Once = Once::new();

/// Initialize the global logger.
/// This should be called once at the start of the application
pub fn init_logger() {
    init_logger_with_level(Level::INFO);
}

/// Initialize logger with custom log level
pub fn init_logger_with_level(level: Level) {
    INIT.call_once(|| {
        install(fmt_builder().with_max_level(level).finish(), level_filter(level));
    });
}

/// Initialize logger with environment variable support
/// Uses RUST_LOG environment variable for configuration
pub fn init_logger_with_env() {
    INIT.call_once(|| {
        let max_level = std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string())
            .parse::<LevelFilter>()
            .unwrap_or(LevelFilter::Info);

        install(
            fmt_builder()
                .with_env_filter(EnvFilter::from_default_env())
                .finish(),
            max_level,
        );
    });
}

/// Initialize logger so that records at the configured severity are shown
pub fn init_logger_with_config(level: Severity) {
    init_logger_with_level(level.to_tracing_level());
}

fn fmt_builder() -> SubscriberBuilder {
    FmtSubscriber::builder()
        .with_target(true)
        .with_thread_ids(true)
        .with_level(true)
        .with_ansi(false)
}

fn install<S>(subscriber: S, max_level: LevelFilter)
where
    S: tracing::Subscriber + Send + Sync + 'static,
{
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: Failed to set global subscriber: {:?}", e);
    }

    // Initialize LogTracer to bridge log events to tracing (after subscriber is set up)
    if let Err(e) = LogTracer::init() {
        eprintln!("Warning: Failed to initialize LogTracer: {:?}", e);
    }

    log::set_max_level(max_level);
}

fn level_filter(level: Level) -> LevelFilter {
    match level {
        Level::ERROR => LevelFilter::Error,
        Level::WARN => LevelFilter::Warn,
        Level::INFO => LevelFilter::Info,
        Level::DEBUG => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Log an error message
pub fn log_error(message: &str) {
    error!("{}", message);
}

/// Log an info message
pub fn log_info(message: &str) {
    info!("{}", message);
}

/// Convenience macro for logging errors
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::logging::log_error(&format!($($arg)*));
    };
}

/// Convenience macro for logging info messages
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logging::log_info(&format!($($arg)*));
    };
}
