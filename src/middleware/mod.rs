//! Built-in middlewares that descriptors can reference by name.
//!
//! Each constructor returns a [`crate::chain::Middleware`] ready to be placed in
//! front of a terminal handler.

pub mod auth;
pub mod request_log;
pub mod security_headers;

pub use auth::bearer_auth;
pub use request_log::request_log;
pub use security_headers::security_headers;
