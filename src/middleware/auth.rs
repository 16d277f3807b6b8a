use std::sync::Arc;

use axum::{
    extract::Request,
    http::header,
    response::{IntoResponse, Response},
};

use crate::chain::{middleware_fn, Middleware, Next};
use crate::error::HttpError;

/// Builds the `bearer_auth` middleware.
///
/// With a token configured, every request must carry a matching
/// `Authorization: Bearer <token>` header. Without one the middleware passes
/// requests straight through.
pub fn bearer_auth(token: Option<String>) -> Middleware {
    let token: Option<Arc<str>> = token.filter(|t| !t.is_empty()).map(Into::into);
    middleware_fn(move |req, next| {
        let token = token.clone();
        async move { check_bearer(token.as_deref(), req, next).await }
    })
}

async fn check_bearer(expected: Option<&str>, req: Request, next: Next) -> Response {
    let Some(expected) = expected else {
        return next.run(req).await;
    };

    let provided = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let rejection = match provided {
        Some(provided) if constant_time_eq(provided.as_bytes(), expected.as_bytes()) => None,
        Some(_) => Some("invalid bearer token"),
        None => Some("missing bearer token"),
    };
    match rejection {
        None => next.run(req).await,
        Some(msg) => HttpError::Unauthorized(msg.into()).into_response(),
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}
