//! Router side of the loader: the registration seam and its axum-backed implementation.

use std::collections::HashSet;

use axum::{
    extract::Request,
    http::Method,
    routing::{MethodFilter, MethodRouter},
    Router,
};

use crate::chain::HandlerChain;

/// Anything routes can be registered with.
pub trait RouteRegistrar {
    fn register(&mut self, method: Method, path: &str, chain: HandlerChain);
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub method: Method,
    pub path: String,
    pub chain: HandlerChain,
}

#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
    /// Mount point for every registered route, e.g. `/api`.
    pub prefix: Option<String>,
}

/// Collects registrations and turns them into an [`axum::Router`].
///
/// Registrations are kept exactly as received, duplicates included. When the axum
/// router is built, the first registration of a method/path pair is served and any
/// later one is reported as shadowed.
#[derive(Debug, Clone, Default)]
pub struct RouterMiddleware {
    options: RouterOptions,
    registrations: Vec<Registration>,
}

impl RouterMiddleware {
    pub fn new(options: RouterOptions) -> Self {
        Self { options, registrations: Vec::new() }
    }

    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    /// Method and path of every registration, in registration order.
    pub fn route_table(&self) -> Vec<(Method, String)> {
        self.registrations.iter().map(|r| (r.method.clone(), r.path.clone())).collect()
    }

    /// Builds the axum router.
    ///
    /// Registrations axum would refuse are skipped with a warning instead of
    /// panicking: malformed paths, repeated method/path pairs, and paths that
    /// conflict with an earlier one. Paths differing only in parameter names
    /// (`/users/:id` and `/users/:userId`) share one route served under the first
    /// spelling.
    pub fn routes(&self) -> Router {
        // (shape, served path, methods)
        let mut grouped: Vec<(String, String, Vec<(MethodFilter, HandlerChain)>)> = Vec::new();
        let mut seen: HashSet<(String, Method)> = HashSet::new();
        let mut matcher: matchit::Router<()> = matchit::Router::new();

        for reg in &self.registrations {
            if let Err(reason) = check_route_path(&reg.path) {
                tracing::warn!(method = %reg.method, path = %reg.path, "Invalid route path, route skipped: {}", reason);
                continue;
            }
            let path = to_axum_path(&reg.path);
            let shape = route_shape(&path);
            if seen.contains(&(shape.clone(), reg.method.clone())) {
                tracing::warn!(method = %reg.method, path = %reg.path, "Route already registered, later registration is shadowed");
                continue;
            }
            let filter = match MethodFilter::try_from(reg.method.clone()) {
                Ok(f) => f,
                Err(_) => {
                    tracing::warn!(method = %reg.method, path = %reg.path, "Unsupported method, route skipped");
                    continue;
                }
            };
            match grouped.iter_mut().find(|(s, _, _)| *s == shape) {
                Some((_, served, methods)) => {
                    if *served != path {
                        tracing::warn!(method = %reg.method, path = %reg.path, served = %served, "Route parameters renamed to match an earlier registration");
                    }
                    methods.push((filter, reg.chain.clone()));
                }
                None => {
                    if let Err(e) = matcher.insert(path.clone(), ()) {
                        tracing::warn!(method = %reg.method, path = %reg.path, "Route conflicts with an earlier registration, route skipped: {}", e);
                        continue;
                    }
                    grouped.push((shape.clone(), path, vec![(filter, reg.chain.clone())]));
                }
            }
            seen.insert((shape, reg.method.clone()));
        }

        let mut router = Router::new();
        for (_, path, methods) in grouped {
            let method_router = methods
                .into_iter()
                .fold(MethodRouter::new(), |mr, (filter, chain)| mr.on(filter, chain_handler(chain)));
            router = router.route(&path, method_router);
        }

        match self.options.prefix.as_deref().map(|p| p.trim_end_matches('/')).filter(|p| !p.is_empty()) {
            Some(prefix) => Router::new().nest(prefix, router),
            None => router,
        }
    }
}

impl RouteRegistrar for RouterMiddleware {
    fn register(&mut self, method: Method, path: &str, chain: HandlerChain) {
        self.registrations.push(Registration { method, path: path.to_string(), chain });
    }
}

fn chain_handler(
    chain: HandlerChain,
) -> impl Fn(Request) -> futures::future::BoxFuture<'static, axum::response::Response> + Clone + Send + Sync + 'static {
    move |req: Request| -> futures::future::BoxFuture<'static, axum::response::Response> {
        let chain = chain.clone();
        Box::pin(async move { chain.run(req).await })
    }
}

/// Checks that a Koa-style path can be turned into an axum route.
///
/// Rejects paths not starting with `/`, literal braces, a bare `:`, segments
/// starting with `*` other than a lone `*`, and a `*` segment anywhere but last.
pub fn check_route_path(path: &str) -> Result<(), String> {
    if !path.starts_with('/') {
        return Err(format!("path {:?} must start with '/'", path));
    }
    let segments: Vec<&str> = path.split('/').skip(1).collect();
    for (i, segment) in segments.iter().enumerate() {
        if segment.contains('{') || segment.contains('}') {
            return Err(format!("path {:?} contains a brace", path));
        }
        if *segment == ":" {
            return Err(format!("path {:?} has a parameter without a name", path));
        }
        if *segment == "*" {
            if i + 1 != segments.len() {
                return Err(format!("path {:?} has a wildcard before the last segment", path));
            }
        } else if segment.starts_with('*') {
            return Err(format!("path {:?} has a segment starting with '*'", path));
        }
    }
    Ok(())
}

/// Converts `:name` parameters to axum's `{name}` form and a trailing `*` to a
/// catch-all. Other segments pass through unchanged.
pub fn to_axum_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if let Some(name) = segment.strip_prefix(':').filter(|n| !n.is_empty()) {
                format!("{{{}}}", name)
            } else if segment == "*" {
                "{*rest}".to_string()
            } else {
                segment.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

// Same shape for paths that only differ in parameter names.
fn route_shape(axum_path: &str) -> String {
    axum_path
        .split('/')
        .map(|segment| {
            if segment.starts_with("{*") {
                "{*}"
            } else if segment.starts_with('{') {
                "{}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
