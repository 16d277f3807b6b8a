//! Named handlers and middlewares that descriptors refer to.
//!
//! Descriptor files only carry names. The [`HandlerRegistry`] maps those names to
//! functions and assembles them into a [`HandlerChain`] for the loader.
//!
//! - `health`: liveness and version handlers
//! - `echo`: request reflection, handy for smoke-testing a route tree

pub mod echo;
pub mod health;

use std::collections::HashMap;

use crate::chain::{handler_fn, Handler, HandlerChain, Middleware};
use crate::config::AppConfig;
use crate::error::LoadError;
use crate::middleware;

#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Handler>,
    middlewares: HashMap<String, Middleware>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in handlers and middlewares.
    ///
    /// Handlers: `healthz`, `version`, `echo`.
    /// Middlewares: `request_log`, `security_headers`, `bearer_auth`.
    pub fn with_builtins(config: &AppConfig) -> Self {
        let mut registry = Self::new();
        registry
            .register_handler("healthz", handler_fn(health::healthz))
            .register_handler("version", handler_fn(health::version))
            .register_handler("echo", handler_fn(echo::echo))
            .register_middleware("request_log", middleware::request_log())
            .register_middleware(
                "security_headers",
                middleware::security_headers(config.security.clone().unwrap_or_default()),
            )
            .register_middleware("bearer_auth", middleware::bearer_auth(config.auth.token.clone()));
        registry
    }

    /// Adds or replaces a terminal handler.
    pub fn register_handler(&mut self, name: impl Into<String>, handler: Handler) -> &mut Self {
        self.handlers.insert(name.into(), handler);
        self
    }

    /// Adds or replaces a middleware.
    pub fn register_middleware(&mut self, name: impl Into<String>, middleware: Middleware) -> &mut Self {
        self.middlewares.insert(name.into(), middleware);
        self
    }

    /// Builds the chain `middlewares..., handler`, keeping the declared order.
    pub fn resolve(&self, middlewares: &[String], handler: &str) -> Result<HandlerChain, LoadError> {
        let mws = middlewares
            .iter()
            .map(|name| {
                self.middlewares
                    .get(name)
                    .cloned()
                    .ok_or_else(|| LoadError::UnknownMiddleware(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let handler = self
            .handlers
            .get(handler)
            .cloned()
            .ok_or_else(|| LoadError::UnknownHandler(handler.to_string()))?;
        Ok(HandlerChain::new(mws, handler))
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut handlers: Vec<_> = self.handlers.keys().collect();
        let mut middlewares: Vec<_> = self.middlewares.keys().collect();
        handlers.sort();
        middlewares.sort();
        f.debug_struct("HandlerRegistry")
            .field("handlers", &handlers)
            .field("middlewares", &middlewares)
            .finish()
    }
}
