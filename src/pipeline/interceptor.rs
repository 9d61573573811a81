//! The request logging interceptor

use std::sync::Arc;
use tracing::error;

use crate::config::{LoggerSettings, Severity};
use crate::context::current_request_id;
use crate::logging::Emitter;
use crate::models::ErrorRecord;
use crate::pipeline::Exchange;
use crate::record::RecordBuilder;
use crate::utils::time::{format_timestamp, start};

/// Attaches a logging callback to every exchange it sees.
///
/// Cloning is cheap; the settings and sink are shared.
#[derive(Clone)]
pub struct RequestLogger {
    builder: RecordBuilder,
    emitter: Emitter,
}

impl RequestLogger {
    /// Logger writing through the `log` facade
    pub fn new(settings: Arc<LoggerSettings>) -> Self {
        Self::from_parts(RecordBuilder::new(settings), Emitter::default())
    }

    pub fn from_parts(builder: RecordBuilder, emitter: Emitter) -> Self {
        Self { builder, emitter }
    }

    pub fn settings(&self) -> &LoggerSettings {
        self.builder.settings()
    }

    /// Capture the start time and register the record callback.
    ///
    /// The record is built when the exchange is finalized, and only if the
    /// sink accepts the configured level.
    pub fn on_request(&self, exchange: &mut Exchange) {
        let started = start(self.builder.clock());
        let builder = self.builder.clone();
        let emitter = self.emitter.clone();

        exchange.register_before_send(move |exchange| {
            let level = builder.settings().level;
            let outcome = emitter.emit_with(level, || {
                builder.build(exchange, level, started, current_request_id())
            });

            if let Err(e) = &outcome {
                error!("❌ Failed to serialize request record: {}", e);
            }
            debug_assert!(outcome.is_ok(), "request records always serialize");
        });
    }

    /// Emit an error record for a request whose handler failed
    pub fn log_error(&self, kind: &str, message: &str) {
        let clock = self.builder.clock();
        let outcome = self.emitter.emit_with(Severity::Error, || ErrorRecord {
            log_type: "error",
            level: Severity::Error.as_str(),
            kind: kind.to_string(),
            message: message.to_string(),
            request_id: current_request_id(),
            date_time: format_timestamp(clock.now_utc()),
        });

        if let Err(e) = outcome {
            error!("❌ Failed to serialize error record: {}", e);
        }
    }
}
