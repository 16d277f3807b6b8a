//! Security headers for responses produced by loaded routes.
//!
//! Registered as the `security_headers` middleware. Descriptors opt in per method by
//! listing it in their middleware chain.

use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE, PRAGMA};
use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    response::Response,
};
use std::sync::Arc;

use crate::chain::{middleware_fn, Middleware, Next};
use crate::config::SecurityConfig;

/// Builds the middleware with the optional HSTS/CSP settings baked in.
pub fn security_headers(cfg: SecurityConfig) -> Middleware {
    let cfg = Arc::new(cfg);
    middleware_fn(move |req, next| {
        let cfg = cfg.clone();
        async move { apply_security_headers(&cfg, req, next).await }
    })
}

/// Runs the rest of the chain, then adds the hardening headers to its response.
///
/// - `X-Content-Type-Options: nosniff`
/// - `X-Frame-Options: SAMEORIGIN`
/// - `Referrer-Policy: no-referrer`
/// - `Permissions-Policy: geolocation=(), microphone=(), camera=()`
/// - `Cross-Origin-Opener-Policy` / `Cross-Origin-Resource-Policy: same-origin`
/// - `Strict-Transport-Security` and `Content-Security-Policy` when configured
///
/// JSON responses additionally get `Cache-Control: no-store`.
pub async fn apply_security_headers(cfg: &SecurityConfig, req: Request, next: Next) -> Response {
    let mut res = next.run(req).await;
    let headers = res.headers_mut();

    headers.insert(HeaderName::from_static("x-content-type-options"), HeaderValue::from_static("nosniff"));
    headers.insert(HeaderName::from_static("x-frame-options"), HeaderValue::from_static("SAMEORIGIN"));
    headers.insert(HeaderName::from_static("referrer-policy"), HeaderValue::from_static("no-referrer"));
    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static("geolocation=(), microphone=(), camera=()"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-resource-policy"),
        HeaderValue::from_static("same-origin"),
    );

    if cfg.enable_hsts.unwrap_or(false) {
        let max_age = cfg.hsts_max_age.unwrap_or(31536000); // 1 year
        let include_sub = if cfg.hsts_include_subdomains.unwrap_or(false) { "; includeSubDomains" } else { "" };
        let value = format!("max-age={}{}", max_age, include_sub);
        headers.insert(
            HeaderName::from_static("strict-transport-security"),
            HeaderValue::from_str(&value).unwrap_or(HeaderValue::from_static("max-age=31536000")),
        );
    }
    if let Some(csp) = cfg.csp.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        if let Ok(val) = HeaderValue::from_str(csp) {
            headers.insert(HeaderName::from_static("content-security-policy"), val);
        }
    }

    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .is_some_and(|s| s.starts_with("application/json"));
    if is_json {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    }

    res
}
