use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::record::collector::FieldCollection;

// Value used for every field that has nothing to report
pub const NOT_AVAILABLE: &str = "N/A";

// Structured description of one completed request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    // Response
    pub status: String,
    pub state: &'static str,

    // Request
    pub request_id: Option<String>,
    pub method: String,
    pub path: String,
    pub params: FieldCollection,
    pub req_headers: FieldCollection,

    // Process-wide fields
    pub server: String,
    pub app: String,
    pub environment: String,

    // Record metadata
    pub log_type: &'static str,
    pub level: &'static str,
    pub duration: f64,
    pub date_time: String,

    // Derived from the request headers
    pub client_version: String,
    pub client_ip: String,
    pub api_version: String,

    // Routing metadata
    pub format: String,
    pub handler: String,

    // Host-supplied attributes, never overriding the fields above
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl LogRecord {
    // Keys owned by the fixed schema
    pub const FIELDS: [&'static str; 19] = [
        "status",
        "state",
        "request_id",
        "method",
        "path",
        "params",
        "req_headers",
        "server",
        "app",
        "environment",
        "log_type",
        "level",
        "duration",
        "date_time",
        "client_version",
        "client_ip",
        "api_version",
        "format",
        "handler",
    ];
}

// Record written when the wrapped handler fails
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecord {
    pub log_type: &'static str,
    pub level: &'static str,
    pub kind: String,
    pub message: String,
    pub request_id: Option<String>,
    pub date_time: String,
}
