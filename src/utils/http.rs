//! HTTP utility functions

use hyper::body::HttpBody;
use hyper::{Body, HeaderMap, Uri};
use serde_json::Value;
use tracing::debug;

use crate::pipeline::ConnectionState;

/// Header carrying the correlation id assigned upstream
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request headers as one pair per header name.
///
/// hyper's `HeaderMap` keeps names in first-seen order but groups repeated
/// lines under that first occurrence, so repeated lines are combined into a
/// single `", "`-joined value (RFC 7230 section 3.2.2). Names come out
/// lowercased, as hyper stores them. Values that are not valid UTF-8 are
/// converted lossily rather than dropped.
pub fn header_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
    let pairs: Vec<(String, String)> = headers
        .keys()
        .map(|name| {
            let value = headers
                .get_all(name)
                .iter()
                .map(|value| String::from_utf8_lossy(value.as_bytes()))
                .collect::<Vec<_>>()
                .join(", ");
            (name.as_str().to_string(), value)
        })
        .collect();

    debug!("Extracted {} headers from request", pairs.len());
    pairs
}

/// Query string parameters in the order they appear
pub fn query_params(uri: &Uri) -> Vec<(String, Value)> {
    uri.query()
        .map(|query| {
            form_urlencoded::parse(query.as_bytes())
                .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
                .collect()
        })
        .unwrap_or_default()
}

/// Correlation id sent by the client or an upstream proxy
pub fn request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Check if the response declares chunked transfer encoding
pub fn is_chunked_encoding(headers: &HeaderMap) -> bool {
    headers
        .get_all(hyper::header::TRANSFER_ENCODING)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| {
            value
                .split(',')
                .any(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
        })
}

/// Connection state of a response that is ready to go out
pub fn connection_state(headers: &HeaderMap, body: &Body) -> ConnectionState {
    if is_chunked_encoding(headers) || body.size_hint().exact().is_none() {
        ConnectionState::Chunked
    } else {
        ConnectionState::Set
    }
}
