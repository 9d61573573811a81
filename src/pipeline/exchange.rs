//! Request/response exchange seen by the interceptor

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Lifecycle state of the response connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// Nothing decided yet
    #[default]
    Unset,
    /// Status and body are fixed, not yet sent
    Set,
    /// Body is served from a file
    File,
    /// Body is streamed in chunks
    Chunked,
    /// Response already went out
    Sent,
}

impl ConnectionState {
    pub fn is_chunked(&self) -> bool {
        matches!(self, ConnectionState::Chunked)
    }
}

/// Routing metadata supplied by the host framework.
///
/// All three identifiers come together; there is no partial form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteInfo {
    pub format: String,
    pub controller: String,
    pub action: String,
}

impl RouteInfo {
    pub fn new(
        format: impl Into<String>,
        controller: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            format: format.into(),
            controller: controller.into(),
            action: action.into(),
        }
    }

    /// `Controller#action`
    pub fn handler(&self) -> String {
        format!("{}#{}", self.controller, self.action)
    }
}

/// Callback run once the response is final but before it is sent
pub type BeforeSend = Box<dyn FnOnce(&Exchange) + Send>;

/// One request/response pair flowing through the host pipeline
pub struct Exchange {
    pub method: String,
    pub path: String,
    pub status: u16,
    pub state: ConnectionState,
    /// Request headers in the order they were received
    pub headers: Vec<(String, String)>,
    /// Query/body parameters in the order they were parsed
    pub params: Vec<(String, Value)>,
    pub route: Option<RouteInfo>,
    before_send: Vec<BeforeSend>,
    finalized: bool,
}

impl Exchange {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            status: 200,
            state: ConnectionState::Unset,
            headers: Vec::new(),
            params: Vec::new(),
            route: None,
            before_send: Vec::new(),
            finalized: false,
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn with_route(mut self, route: RouteInfo) -> Self {
        self.route = Some(route);
        self
    }

    /// Fix the response status and connection state
    pub fn respond(&mut self, status: u16, state: ConnectionState) {
        self.status = status;
        self.state = state;
    }

    /// Queue a callback for [`Exchange::finalize`]. Callbacks run in
    /// registration order.
    pub fn register_before_send<F>(&mut self, callback: F)
    where
        F: FnOnce(&Exchange) + Send + 'static,
    {
        self.before_send.push(Box::new(callback));
    }

    /// Run the queued callbacks. Only the first call has any effect.
    pub fn finalize(&mut self) {
        if self.finalized {
            return;
        }
        self.finalized = true;

        let callbacks = std::mem::take(&mut self.before_send);
        for callback in callbacks {
            callback(&*self);
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
}

impl fmt::Debug for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exchange")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("status", &self.status)
            .field("state", &self.state)
            .field("headers", &self.headers)
            .field("params", &self.params)
            .field("route", &self.route)
            .field("before_send", &self.before_send.len())
            .field("finalized", &self.finalized)
            .finish()
    }
}
