//! In-crate tests for RouteWald.
//!
//! - **support**: shared fixtures (recording registrar/logger, test registry, temp trees)
//! - **descriptor_tests**: descriptor parsing and the file provider
//! - **loader_tests**: directory traversal, filtering, counting and failure isolation
//! - **router_tests**: chains served through the axum router
//! - **config_tests**: configuration defaults, overrides and validation
//!
//! Run a single module with e.g. `cargo test loader_tests`.

pub mod support;
pub mod router_tests;
