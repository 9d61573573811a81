//! Deferred, level-gated emission of serialized records

use serde::Serialize;
use std::sync::{Arc, Mutex};

use crate::config::Severity;
use crate::error::Result;

/// `log` target request records are written under
pub const RECORD_TARGET: &str = "request_log";

/// Destination of serialized records
pub trait LogSink: Send + Sync {
    /// Whether a record at `level` would be written at all
    fn enabled(&self, level: Severity) -> bool;

    /// Write one serialized record. Failures are the sink's own business.
    fn write(&self, level: Severity, line: &str);
}

/// Sink writing through the `log` facade, bridged into `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct LogCrateSink;

impl LogSink for LogCrateSink {
    fn enabled(&self, level: Severity) -> bool {
        log::log_enabled!(target: RECORD_TARGET, level.to_log_level())
    }

    fn write(&self, level: Severity, line: &str) {
        log::log!(target: RECORD_TARGET, level.to_log_level(), "{}", line);
    }
}

/// Sink keeping records in memory, for tests and embedding hosts
#[derive(Debug, Default)]
pub struct MemorySink {
    threshold: Severity,
    lines: Mutex<Vec<(Severity, String)>>,
}

impl MemorySink {
    /// Keep records at `threshold` or above
    pub fn new(threshold: Severity) -> Self {
        Self {
            threshold,
            lines: Mutex::new(Vec::new()),
        }
    }

    /// Records written so far
    pub fn lines(&self) -> Vec<(Severity, String)> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }
}

impl LogSink for MemorySink {
    fn enabled(&self, level: Severity) -> bool {
        level >= self.threshold
    }

    fn write(&self, level: Severity, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((level, line.to_string()));
        }
    }
}

/// Serializes records and hands them to a [`LogSink`]
#[derive(Clone)]
pub struct Emitter {
    sink: Arc<dyn LogSink>,
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new(Arc::new(LogCrateSink))
    }
}

impl Emitter {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    pub fn enabled(&self, level: Severity) -> bool {
        self.sink.enabled(level)
    }

    /// Serialize `record` as one JSON line and write it at `level`
    pub fn emit<T: Serialize>(&self, record: &T, level: Severity) -> Result<()> {
        if !self.sink.enabled(level) {
            return Ok(());
        }
        let line = serde_json::to_string(record)?;
        self.sink.write(level, &line);
        Ok(())
    }

    /// Build and emit a record only if `level` is enabled.
    ///
    /// Returns `Ok(false)` without calling `build` when the sink would drop
    /// the record.
    pub fn emit_with<T, F>(&self, level: Severity, build: F) -> Result<bool>
    where
        T: Serialize,
        F: FnOnce() -> T,
    {
        if !self.sink.enabled(level) {
            return Ok(false);
        }
        let line = serde_json::to_string(&build())?;
        self.sink.write(level, &line);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::Error as _;
    use serde_json::{json, Value};
    use std::cell::Cell;

    struct Unserializable;

    /// `log` backend recording what reaches the facade at info or above
    struct CaptureLogger {
        records: Mutex<Vec<(log::Level, String, String)>>,
    }

    impl log::Log for CaptureLogger {
        fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
            metadata.level() <= log::Level::Info
        }

        fn log(&self, record: &log::Record<'_>) {
            if self.enabled(record.metadata()) {
                self.records.lock().unwrap().push((
                    record.level(),
                    record.target().to_string(),
                    record.args().to_string(),
                ));
            }
        }

        fn flush(&self) {}
    }

    static CAPTURE: CaptureLogger = CaptureLogger {
        records: Mutex::new(Vec::new()),
    };

    fn capture_log_facade() {
        static INSTALL: std::sync::Once = std::sync::Once::new();
        INSTALL.call_once(|| {
            log::set_logger(&CAPTURE).unwrap();
            log::set_max_level(log::LevelFilter::Trace);
        });
    }

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> std::result::Result<S::Ok, S::Error> {
            Err(S::Error::custom("not representable"))
        }
    }

    #[test]
    fn test_emit_writes_one_json_line() {
        let sink = Arc::new(MemorySink::new(Severity::Info));
        let emitter = Emitter::new(sink.clone());

        emitter
            .emit(&json!({"status": "200", "log_type": "http"}), Severity::Info)
            .unwrap();

        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, Severity::Info);
        assert!(!lines[0].1.contains('\n'));
        let parsed: Value = serde_json::from_str(&lines[0].1).unwrap();
        assert_eq!(parsed, json!({"log_type": "http", "status": "200"}));
    }

    #[test]
    fn test_suppressed_level_skips_build() {
        let sink = Arc::new(MemorySink::new(Severity::Warn));
        let emitter = Emitter::new(sink.clone());
        let calls = Cell::new(0);

        let written = emitter
            .emit_with(Severity::Info, || {
                calls.set(calls.get() + 1);
                json!({"status": "200"})
            })
            .unwrap();

        assert!(!written);
        assert_eq!(calls.get(), 0);
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn test_enabled_level_builds_once() {
        let sink = Arc::new(MemorySink::new(Severity::Debug));
        let emitter = Emitter::new(sink.clone());
        let calls = Cell::new(0);

        let written = emitter
            .emit_with(Severity::Error, || {
                calls.set(calls.get() + 1);
                json!({"status": "500"})
            })
            .unwrap();

        assert!(written);
        assert_eq!(calls.get(), 1);
        assert_eq!(sink.lines()[0].0, Severity::Error);
    }

    #[test]
    fn test_serialization_failure_is_reported() {
        let sink = Arc::new(MemorySink::new(Severity::Trace));
        let emitter = Emitter::new(sink.clone());

        let err = emitter.emit(&Unserializable, Severity::Info).unwrap_err();
        assert!(err.to_string().contains("not representable"));
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn test_log_crate_sink_writes_through_log_facade() {
        capture_log_facade();
        let sink = LogCrateSink;

        assert!(sink.enabled(Severity::Warn));
        assert!(sink.enabled(Severity::Info));
        assert!(!sink.enabled(Severity::Debug));

        let emitter = Emitter::default();
        emitter
            .emit(&json!({"path": "/facade-check"}), Severity::Warn)
            .unwrap();
        emitter
            .emit(&json!({"path": "/facade-check-debug"}), Severity::Debug)
            .unwrap();

        let records = CAPTURE.records.lock().unwrap();
        let written: Vec<_> = records
            .iter()
            .filter(|(_, target, line)| target == RECORD_TARGET && line.contains("/facade-check"))
            .collect();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].0, log::Level::Warn);
        assert_eq!(written[0].2, r#"{"path":"/facade-check"}"#);
    }
}
