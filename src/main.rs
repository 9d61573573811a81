//! Demo server showing the request logger in front of a trivial handler

use hyper::{Body, Request, Response};
use request_log_interceptor::{
    init_logger_with_config, init_logger_with_env, log_error, log_info, serve, LoggerSettings,
    RequestLogger, Result, RouteInfo,
};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

async fn index(_request: Request<Body>) -> std::result::Result<Response<Body>, Infallible> {
    let mut response = Response::new(Body::from(r#"{"status":"ok"}"#));
    response
        .extensions_mut()
        .insert(RouteInfo::new("json", "PageController", "index"));
    Ok(response)
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Request logger demo failed: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load configuration from request_log.yml or environment variables
    let settings = LoggerSettings::load_config()?;

    // RUST_LOG takes over the subscriber filter when set
    if std::env::var_os("RUST_LOG").is_some() {
        init_logger_with_env();
    } else {
        init_logger_with_config(settings.level);
    }

    let addr: SocketAddr = std::env::var("REQUEST_LOG_LISTEN_ADDR")
        .ok()
        .and_then(|addr| addr.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8080)));

    log_info!("Starting request logger demo on {}", addr);
    log_info!("Records are written at level '{}'", settings.level);
    log_info!("Test with: curl -H 'x-request-id: abc123' 'http://{}/?user=jkelly'", addr);

    let logger = RequestLogger::new(Arc::new(settings));
    serve(addr, logger, index).await.map_err(|e| {
        log_error!("Server error: {}", e);
        e
    })
}
