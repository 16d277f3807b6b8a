use std::time::Instant;

use axum::{extract::Request, response::Response};

use crate::chain::{middleware_fn, Middleware, Next};

/// `request_log`: one tracing line per request with method, URI, status and latency.
pub fn request_log() -> Middleware {
    middleware_fn(log_request)
}

async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let started = Instant::now();
    let res = next.run(req).await;
    tracing::info!(
        %method,
        %uri,
        status = res.status().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "request handled"
    );
    res
}
