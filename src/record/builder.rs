//! Assembly of a [`LogRecord`] from a finalized exchange

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use crate::config::{LoggerSettings, Severity};
use crate::models::{LogRecord, NOT_AVAILABLE};
use crate::pipeline::Exchange;
use crate::record::collector::{collect, text, FieldCollection};
use crate::utils::time::{duration_seconds, elapsed, format_timestamp, Clock, SystemClock};

/// Host hook adding attributes of its own to every record
pub type ExtraAttributes = Arc<dyn Fn(&Exchange) -> Map<String, Value> + Send + Sync>;

const LOG_TYPE: &str = "http";
const STATE_CHUNKED: &str = "Chunked";
const STATE_SENT: &str = "Sent";

/// Shared, read-only recipe for building request records
#[derive(Clone)]
pub struct RecordBuilder {
    settings: Arc<LoggerSettings>,
    clock: Arc<dyn Clock>,
    extra_attributes: Option<ExtraAttributes>,
}

impl RecordBuilder {
    pub fn new(settings: Arc<LoggerSettings>) -> Self {
        Self {
            settings,
            clock: Arc::new(SystemClock),
            extra_attributes: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_extra_attributes<F>(mut self, attributes: F) -> Self
    where
        F: Fn(&Exchange) -> Map<String, Value> + Send + Sync + 'static,
    {
        self.extra_attributes = Some(Arc::new(attributes));
        self
    }

    pub fn settings(&self) -> &LoggerSettings {
        &self.settings
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Build the record for `exchange`, started at `start`
    pub fn build(
        &self,
        exchange: &Exchange,
        level: Severity,
        start: Instant,
        request_id: Option<String>,
    ) -> LogRecord {
        let mut record = build(
            exchange,
            level,
            start,
            &self.settings,
            request_id,
            self.clock.as_ref(),
        );

        if let Some(attributes) = &self.extra_attributes {
            record.extra = extra_fields(attributes(exchange));
        }

        record
    }
}

/// Build the record for `exchange` from explicit inputs.
///
/// Every field falls back to a fixed value, so this never fails.
pub fn build(
    exchange: &Exchange,
    level: Severity,
    start: Instant,
    settings: &LoggerSettings,
    request_id: Option<String>,
    clock: &dyn Clock,
) -> LogRecord {
    let req_headers = collect(
        exchange
            .headers
            .iter()
            .map(|(key, value)| (key.as_str(), Value::from(value.as_str()))),
        &settings.filtered_keys,
    );
    let params = collect(
        exchange.params.iter().map(|(key, value)| (key.as_str(), value)),
        &settings.filtered_keys,
    );

    let (format, handler) = match &exchange.route {
        Some(route) => (route.format.clone(), route.handler()),
        None => (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string()),
    };

    LogRecord {
        status: exchange.status.to_string(),
        state: if exchange.state.is_chunked() {
            STATE_CHUNKED
        } else {
            STATE_SENT
        },
        request_id,
        method: exchange.method.clone(),
        path: exchange.path.clone(),
        server: or_not_available(settings.server.as_deref()),
        app: or_not_available(settings.app.as_deref()),
        environment: or_not_available(settings.environment.as_deref()),
        log_type: LOG_TYPE,
        level: level.as_str(),
        duration: duration_seconds(elapsed(start, clock)),
        date_time: format_timestamp(clock.now_utc()),
        client_version: header_or_not_available(&req_headers, "client_version"),
        client_ip: client_ip(&req_headers),
        api_version: header_or_not_available(&req_headers, "api_version"),
        format,
        handler,
        params,
        req_headers,
        extra: BTreeMap::new(),
    }
}

/// First address of the `x-forwarded-for` chain
fn client_ip(headers: &FieldCollection) -> String {
    text(headers, "x-forwarded-for")
        .and_then(|chain| chain.split(", ").next().map(str::to_string))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn header_or_not_available(headers: &FieldCollection, key: &str) -> String {
    text(headers, key).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn or_not_available(value: Option<&str>) -> String {
    value.unwrap_or(NOT_AVAILABLE).to_string()
}

/// Drop host attributes that would shadow a schema field
fn extra_fields(attributes: Map<String, Value>) -> BTreeMap<String, Value> {
    attributes
        .into_iter()
        .filter(|(key, _)| !LogRecord::FIELDS.contains(&key.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{ConnectionState, RouteInfo};
    use crate::utils::time::tests::FixedClock;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::time::Duration;

    fn settings() -> LoggerSettings {
        LoggerSettings {
            server: Some("localhost".to_string()),
            app: Some("reaction".to_string()),
            environment: Some("development".to_string()),
            ..Default::default()
        }
        .with_filtered_keys(["authorization", "password"])
    }

    fn frozen_clock(start: Instant) -> FixedClock {
        FixedClock::new(
            start + Duration::from_micros(670_000),
            Utc.with_ymd_and_hms(2016, 5, 31, 18, 0, 13).unwrap(),
        )
    }

    fn login_exchange() -> Exchange {
        let mut exchange = Exchange::new("POST", "/")
            .with_header("authorization", "secret123")
            .with_header("accept", "*/*")
            .with_param("user", "jkelly")
            .with_param("password", "hunter2");
        exchange.respond(200, ConnectionState::Set);
        exchange
    }

    #[test]
    fn test_login_request_record() {
        let start = Instant::now();
        let clock = frozen_clock(start);
        let record = build(
            &login_exchange(),
            Severity::Info,
            start,
            &settings(),
            Some("abc123".to_string()),
            &clock,
        );

        assert_eq!(record.req_headers["authorization"], json!("[FILTERED]"));
        assert_eq!(record.req_headers["accept"], json!("*/*"));
        assert_eq!(record.params["password"], json!("[FILTERED]"));
        assert_eq!(record.params["user"], json!("jkelly"));
        assert_eq!(record.format, "N/A");
        assert_eq!(record.handler, "N/A");
        assert_eq!(record.state, "Sent");
        assert_eq!(record.status, "200");
        assert_eq!(record.method, "POST");
        assert_eq!(record.path, "/");
        assert_eq!(record.log_type, "http");
        assert_eq!(record.level, "info");
        assert_eq!(record.request_id.as_deref(), Some("abc123"));
        assert_eq!(record.duration, 0.670);
        assert_eq!(record.date_time, "2016-05-31T18:00:13Z");
        assert_eq!(record.server, "localhost");
        assert_eq!(record.app, "reaction");
        assert_eq!(record.environment, "development");
        assert_eq!(record.client_ip, "N/A");
        assert_eq!(record.client_version, "N/A");
        assert_eq!(record.api_version, "N/A");
    }

    #[test]
    fn test_serialized_shape() {
        let start = Instant::now();
        let clock = frozen_clock(start);
        let mut exchange = login_exchange()
            .with_header("x-forwarded-for", "127.0.0.1")
            .with_route(RouteInfo::new("json", "PageController", "index"));
        exchange.respond(200, ConnectionState::Set);

        let record = build(
            &exchange,
            Severity::Info,
            start,
            &settings(),
            Some("abc123".to_string()),
            &clock,
        );

        let expected = json!({
            "status": "200",
            "state": "Sent",
            "request_id": "abc123",
            "path": "/",
            "params": {"user": "jkelly", "password": "[FILTERED]"},
            "req_headers": {
                "authorization": "[FILTERED]",
                "accept": "*/*",
                "x-forwarded-for": "127.0.0.1"
            },
            "server": "localhost",
            "method": "POST",
            "log_type": "http",
            "level": "info",
            "environment": "development",
            "duration": 0.670,
            "date_time": "2016-05-31T18:00:13Z",
            "client_version": "N/A",
            "client_ip": "127.0.0.1",
            "app": "reaction",
            "api_version": "N/A",
            "format": "json",
            "handler": "PageController#index"
        });
        assert_eq!(serde_json::to_value(&record).unwrap(), expected);
    }

    #[test]
    fn test_chunked_state() {
        let start = Instant::now();
        let clock = frozen_clock(start);
        let mut exchange = Exchange::new("GET", "/stream");
        exchange.respond(200, ConnectionState::Chunked);

        let record = build(&exchange, Severity::Info, start, &settings(), None, &clock);
        assert_eq!(record.state, "Chunked");

        for state in [ConnectionState::Unset, ConnectionState::File, ConnectionState::Sent] {
            exchange.respond(200, state);
            let record = build(&exchange, Severity::Info, start, &settings(), None, &clock);
            assert_eq!(record.state, "Sent");
        }
    }

    #[test]
    fn test_client_ip_takes_first_proxy_hop() {
        let start = Instant::now();
        let clock = frozen_clock(start);
        let exchange = Exchange::new("GET", "/")
            .with_header("x-forwarded-for", "203.0.113.5, 70.41.3.18");

        let record = build(&exchange, Severity::Info, start, &settings(), None, &clock);
        assert_eq!(record.client_ip, "203.0.113.5");
    }

    #[test]
    fn test_client_ip_is_not_validated() {
        let start = Instant::now();
        let clock = frozen_clock(start);
        let exchange = Exchange::new("GET", "/").with_header("x-forwarded-for", "unknown,10.0.0.1");

        let record = build(&exchange, Severity::Info, start, &settings(), None, &clock);
        assert_eq!(record.client_ip, "unknown,10.0.0.1");
    }

    #[test]
    fn test_header_metadata() {
        let start = Instant::now();
        let clock = frozen_clock(start);
        let exchange = Exchange::new("GET", "/")
            .with_header("client_version", "ios/1.4.2")
            .with_header("api_version", "v2");

        let record = build(&exchange, Severity::Debug, start, &settings(), None, &clock);
        assert_eq!(record.client_version, "ios/1.4.2");
        assert_eq!(record.api_version, "v2");
        assert_eq!(record.level, "debug");
        assert_eq!(record.request_id, None);
    }

    #[test]
    fn test_metadata_reads_sanitized_headers() {
        let start = Instant::now();
        let clock = frozen_clock(start);
        let settings = settings().with_filtered_keys(["api_version"]);
        let exchange = Exchange::new("GET", "/").with_header("api_version", "v2");

        let record = build(&exchange, Severity::Info, start, &settings, None, &clock);
        assert_eq!(record.api_version, "[FILTERED]");
    }

    #[test]
    fn test_metadata_past_header_limit_is_ignored() {
        let start = Instant::now();
        let clock = frozen_clock(start);
        let mut exchange = Exchange::new("GET", "/");
        for i in 0..20 {
            exchange = exchange.with_header(format!("x-filler-{}", i), "1");
        }
        exchange = exchange.with_header("x-forwarded-for", "203.0.113.5");

        let record = build(&exchange, Severity::Info, start, &settings(), None, &clock);
        assert_eq!(record.req_headers.len(), 20);
        assert_eq!(record.client_ip, "N/A");
    }

    #[test]
    fn test_unset_static_fields() {
        let start = Instant::now();
        let clock = frozen_clock(start);
        let record = build(
            &Exchange::new("GET", "/"),
            Severity::Info,
            start,
            &LoggerSettings::default(),
            None,
            &clock,
        );
        assert_eq!(record.server, "N/A");
        assert_eq!(record.app, "N/A");
        assert_eq!(record.environment, "N/A");
        assert!(record.params.is_empty());
        assert!(record.req_headers.is_empty());
    }

    #[test]
    fn test_zero_duration() {
        let start = Instant::now();
        let clock = FixedClock::new(start, Utc::now());
        let record = build(&Exchange::new("GET", "/"), Severity::Info, start, &settings(), None, &clock);
        assert_eq!(record.duration, 0.0);
    }

    #[test]
    fn test_rebuild_is_identical_apart_from_timestamp() {
        let start = Instant::now();
        let exchange = login_exchange();
        let builder = RecordBuilder::new(Arc::new(settings()));

        let first = builder.build(&exchange, Severity::Info, start, Some("abc".to_string()));
        let mut second = builder.build(&exchange, Severity::Info, start, Some("abc".to_string()));

        second.date_time = first.date_time.clone();
        second.duration = first.duration;
        assert_eq!(first, second);
    }

    #[test]
    fn test_frozen_inputs_build_identical_records() {
        let start = Instant::now();
        let clock = frozen_clock(start);
        let exchange = login_exchange();

        let first = build(&exchange, Severity::Info, start, &settings(), None, &clock);
        let second = build(&exchange, Severity::Info, start, &settings(), None, &clock);
        assert_eq!(first, second);
    }

    #[test]
    fn test_extra_attributes_cannot_shadow_schema() {
        let start = Instant::now();
        let builder = RecordBuilder::new(Arc::new(settings()))
            .with_clock(Arc::new(frozen_clock(start)))
            .with_extra_attributes(|exchange| {
                let mut extra = Map::new();
                extra.insert("status".to_string(), json!("hijacked"));
                extra.insert("route_len".to_string(), json!(exchange.path.len()));
                extra
            });

        let record = builder.build(&login_exchange(), Severity::Info, start, None);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["status"], json!("200"));
        assert_eq!(value["route_len"], json!(1));
    }
}
