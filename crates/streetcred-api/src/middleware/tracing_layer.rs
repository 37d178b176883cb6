//! Request tracing.
//!
//! One `http_request` span per request carrying method and path. Responses
//! are logged at `info` with status and latency, server failures at `error`.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use tower_http::trace::{DefaultOnFailure, TraceLayer};
use tracing::{Level, Span};

/// Wrap `router` in the request-tracing layer.
pub fn apply<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            })
            .on_response(|response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis() as u64,
                    "request completed"
                );
            })
            .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
    )
}
