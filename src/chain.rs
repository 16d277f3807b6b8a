//! Handler chains: ordered middlewares followed by one terminal handler.
//!
//! A middleware receives the request together with a [`Next`] handle. Calling
//! [`Next::run`] hands the request to the following middleware (or to the terminal
//! handler once the middlewares are exhausted); returning without calling it ends
//! the chain early with the middleware's own response.

use std::future::Future;
use std::sync::Arc;

use axum::{extract::Request, response::Response};
use futures::future::BoxFuture;

/// Terminal handler of a chain.
pub type Handler = Arc<dyn Fn(Request) -> BoxFuture<'static, Response> + Send + Sync>;

/// Middleware placed in front of a terminal handler.
pub type Middleware = Arc<dyn Fn(Request, Next) -> BoxFuture<'static, Response> + Send + Sync>;

/// Wraps an async function into a [`Handler`].
pub fn handler_fn<F, Fut>(f: F) -> Handler
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |req: Request| -> BoxFuture<'static, Response> { Box::pin(f(req)) })
}

/// Wraps an async function into a [`Middleware`].
pub fn middleware_fn<F, Fut>(f: F) -> Middleware
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |req: Request, next: Next| -> BoxFuture<'static, Response> { Box::pin(f(req, next)) })
}

#[derive(Clone)]
pub struct HandlerChain {
    middlewares: Arc<[Middleware]>,
    handler: Handler,
}

impl HandlerChain {
    pub fn new(middlewares: Vec<Middleware>, handler: Handler) -> Self {
        Self { middlewares: middlewares.into(), handler }
    }

    /// Number of functions in the chain, terminal handler included.
    pub fn len(&self) -> usize {
        self.middlewares.len() + 1
    }

    pub async fn run(&self, req: Request) -> Response {
        Next { chain: self.clone(), index: 0 }.run(req).await
    }
}

impl std::fmt::Debug for HandlerChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerChain").field("middlewares", &self.middlewares.len()).finish()
    }
}

/// The remainder of a chain, as seen from inside a middleware.
pub struct Next {
    chain: HandlerChain,
    index: usize,
}

impl Next {
    pub async fn run(self, req: Request) -> Response {
        match self.chain.middlewares.get(self.index) {
            Some(middleware) => {
                let middleware = middleware.clone();
                let next = Next { chain: self.chain.clone(), index: self.index + 1 };
                middleware(req, next).await
            }
            None => (self.chain.handler)(req).await,
        }
    }
}
