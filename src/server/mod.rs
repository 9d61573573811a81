//! hyper integration: wraps a request handler with the request logger

use futures::future::BoxFuture;
use hyper::service::{make_service_fn, Service};
use hyper::{Body, Request, Response, Server, StatusCode};
use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::{debug, info};

use crate::context;
use crate::error::Result;
use crate::pipeline::{Exchange, RequestLogger, RouteInfo};
use crate::utils::http::{connection_state, header_pairs, query_params, request_id};

/// Application request handler wrapped by [`LoggedService`].
///
/// Implemented for every `Fn(Request<Body>) -> impl Future<Output = Result<Response<Body>, E>>`.
/// A handler can attach a [`RouteInfo`] to the response extensions to fill
/// the `format` and `handler` fields of the record.
pub trait Handler: Send + Sync + 'static {
    type Error: fmt::Display + Send;

    fn handle(&self, request: Request<Body>) -> BoxFuture<'static, std::result::Result<Response<Body>, Self::Error>>;
}

impl<F, Fut, E> Handler for F
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<Response<Body>, E>> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    type Error = E;

    fn handle(&self, request: Request<Body>) -> BoxFuture<'static, std::result::Result<Response<Body>, E>> {
        Box::pin(self(request))
    }
}

/// hyper service logging every exchange that reaches the wrapped handler
pub struct LoggedService<H> {
    logger: RequestLogger,
    handler: Arc<H>,
}

impl<H> Clone for LoggedService<H> {
    fn clone(&self) -> Self {
        Self {
            logger: self.logger.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<H: Handler> LoggedService<H> {
    pub fn new(logger: RequestLogger, handler: H) -> Self {
        Self {
            logger,
            handler: Arc::new(handler),
        }
    }

    /// Run one request through the handler and log it.
    ///
    /// The response is returned exactly as the handler produced it; a
    /// handler error becomes an empty 500.
    pub fn handle(&self, request: Request<Body>) -> BoxFuture<'static, std::result::Result<Response<Body>, Infallible>> {
        let logger = self.logger.clone();
        let handler = Arc::clone(&self.handler);

        let correlation_id = request_id(request.headers());
        let mut exchange = Exchange::new(request.method().as_str(), request.uri().path());
        exchange.headers = header_pairs(request.headers());
        exchange.params = query_params(request.uri());
        logger.on_request(&mut exchange);

        Box::pin(context::scope(correlation_id, async move {
            let response = match handler.handle(request).await {
                Ok(response) => response,
                Err(e) => {
                    logger.log_error("handler", &e.to_string());
                    error_response(StatusCode::INTERNAL_SERVER_ERROR)
                }
            };

            exchange.route = response.extensions().get::<RouteInfo>().cloned();
            exchange.respond(
                response.status().as_u16(),
                connection_state(response.headers(), response.body()),
            );
            exchange.finalize();

            debug!("{} {} -> {}", exchange.method, exchange.path, exchange.status);
            Ok::<_, Infallible>(response)
        }))
    }
}

impl<H: Handler> Service<Request<Body>> for LoggedService<H> {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = BoxFuture<'static, std::result::Result<Response<Body>, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        self.handle(request)
    }
}

/// Serve `handler` on `addr`, logging every request
pub async fn serve<H: Handler>(addr: SocketAddr, logger: RequestLogger, handler: H) -> Result<()> {
    let service = LoggedService::new(logger, handler);
    let make_svc = make_service_fn(move |_conn| {
        let service = service.clone();
        async move { Ok::<_, Infallible>(service) }
    });

    let listener = std::net::TcpListener::bind(addr)?;
    let server = Server::from_tcp(listener)?.serve(make_svc);
    info!("🌐 Request logger listening on {}", server.local_addr());

    server.await?;
    Ok(())
}

/// Build error response
fn error_response(status: StatusCode) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}
