//! Host pipeline abstraction and the interceptor plugged into it

pub mod exchange;
pub mod interceptor;

pub use exchange::{BeforeSend, ConnectionState, Exchange, RouteInfo};
pub use interceptor::RequestLogger;
