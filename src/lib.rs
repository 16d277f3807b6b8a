//! # RouteWald Library
//!
//! RouteWald registers HTTP routes with an axum router by walking a directory tree
//! of route descriptor files. Each descriptor names the URL paths it serves and,
//! per HTTP method, the handler and middlewares to run. Names are resolved against
//! a registry of Rust functions, so adding a route is a matter of dropping a file
//! into the tree.
//!
//! ## Core Components
//!
//! - [`loader`]: recursive discovery and registration of descriptor files
//! - [`descriptor`]: descriptor data model and the providers that parse files
//! - [`handlers`]: named handler/middleware registry and built-in handlers
//! - [`middleware`]: built-in middlewares (request logging, security headers, auth)
//! - [`chain`]: middleware-then-handler execution
//! - [`router`]: registration seam and the axum-backed router
//! - [`config`]: layered application configuration
//! - [`logging`]: loader logger and tracing setup
//! - [`error`]: load, scan and HTTP error types

pub mod chain;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod handlers;
pub mod loader;
pub mod logging;
pub mod middleware;
pub mod router;

#[cfg(test)]
mod tests;

pub use loader::{LoadOptions, RouteLoader};
pub use router::{RouteRegistrar, RouterMiddleware, RouterOptions};
