use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::http::Method;
use axum::response::IntoResponse;

use crate::chain::{handler_fn, middleware_fn, HandlerChain};
use crate::descriptor::FileDescriptorProvider;
use crate::handlers::HandlerRegistry;
use crate::logging::LoadLogger;
use crate::router::RouteRegistrar;
use crate::RouteLoader;

/// Registrar that only remembers what it was given.
#[derive(Default)]
pub struct RecordingRegistrar {
    pub routes: Vec<(Method, String, usize)>,
}

impl RouteRegistrar for RecordingRegistrar {
    fn register(&mut self, method: Method, path: &str, chain: HandlerChain) {
        self.routes.push((method, path.to_string(), chain.len()));
    }
}

impl RecordingRegistrar {
    pub fn pairs(&self) -> Vec<(Method, &str)> {
        self.routes.iter().map(|(m, p, _)| (m.clone(), p.as_str())).collect()
    }
}

#[derive(Default)]
pub struct RecordingLogger {
    pub infos: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
}

impl LoadLogger for RecordingLogger {
    fn info(&self, message: &str) {
        self.infos.lock().unwrap().push(message.to_string());
    }

    fn error(&self, path: &Path, error: &dyn std::error::Error) {
        self.errors.lock().unwrap().push(format!("{}: {}", path.display(), error));
    }
}

/// Handlers `ok` and `created`; middlewares `tag_a`, `tag_b` (append an
/// `x-trail` header on the way out) and `deny` (answers 403 without calling next).
pub fn test_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry
        .register_handler("ok", handler_fn(|_req| async { "ok".into_response() }))
        .register_handler(
            "created",
            handler_fn(|_req| async { (axum::http::StatusCode::CREATED, "created").into_response() }),
        )
        .register_middleware("tag_a", trail_middleware("a"))
        .register_middleware("tag_b", trail_middleware("b"))
        .register_middleware(
            "deny",
            middleware_fn(|_req, _next| async { axum::http::StatusCode::FORBIDDEN.into_response() }),
        );
    registry
}

// Records the order middlewares ran in: each prepends its tag once the inner chain returns.
fn trail_middleware(tag: &'static str) -> crate::chain::Middleware {
    middleware_fn(move |req, next| async move {
        let mut res = next.run(req).await;
        let trail = res
            .headers()
            .get("x-trail")
            .and_then(|v| v.to_str().ok())
            .map(|inner| format!("{},{}", tag, inner))
            .unwrap_or_else(|| tag.to_string());
        res.headers_mut().insert("x-trail", trail.parse().unwrap());
        res
    })
}

pub fn test_loader() -> (RouteLoader, Arc<RecordingLogger>) {
    let logger = Arc::new(RecordingLogger::default());
    let loader = RouteLoader::with_parts(
        Arc::new(FileDescriptorProvider),
        Arc::new(test_registry()),
        logger.clone(),
    );
    (loader, logger)
}

pub fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}
