//! Per-request logging context.
//!
//! The correlation id of the request being served lives in a task-local so
//! the logging callback can read it without threading it through every call.

use std::future::Future;

tokio::task_local! {
    static REQUEST_ID: Option<String>;
}

/// Run `future` with `request_id` as the ambient correlation id
pub async fn scope<F>(request_id: Option<String>, future: F) -> F::Output
where
    F: Future,
{
    REQUEST_ID.scope(request_id, future).await
}

/// Synchronous counterpart of [`scope`]
pub fn sync_scope<F, R>(request_id: Option<String>, f: F) -> R
where
    F: FnOnce() -> R,
{
    REQUEST_ID.sync_scope(request_id, f)
}

/// Correlation id of the current request, `None` outside a scope
pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(|id| id.clone()).ok().flatten()
}
