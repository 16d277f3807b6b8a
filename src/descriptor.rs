//! Route descriptors and the providers that produce them.
//!
//! A descriptor file declares which URL paths it serves and, per HTTP method, the
//! name of a terminal handler plus the names of the middlewares placed in front of
//! it. Example (TOML):
//!
//! ```toml
//! path = ["/users", "/people"]
//! get = "list_users"
//! getMiddlewares = ["request_log"]
//! ```

use std::path::Path;

use async_trait::async_trait;
use axum::http::Method;
use serde::Deserialize;

use crate::error::LoadError;
use crate::router::check_route_path;

/// Methods a descriptor may declare, in registration order.
pub const SUPPORTED_METHODS: [Method; 5] =
    [Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE];

/// Routing data declared by one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDescriptor {
    pub enabled: bool,
    /// `None` when the file declares no path at all.
    pub paths: Option<Vec<String>>,
    /// One entry per supported method that declares anything, in [`SUPPORTED_METHODS`] order.
    pub methods: Vec<MethodSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSpec {
    pub method: Method,
    pub middlewares: Vec<String>,
    /// Terminal handler; the method is not registered without one.
    pub handler: Option<String>,
}

impl RouteDescriptor {
    /// Whether the loader should register anything for this descriptor.
    pub fn is_route(&self) -> bool {
        self.enabled && self.paths.is_some()
    }

    pub fn method(&self, method: &Method) -> Option<&MethodSpec> {
        self.methods.iter().find(|m| &m.method == method)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPath {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct RawDescriptor {
    enabled: Option<bool>,
    path: Option<RawPath>,
    get: Option<String>,
    #[serde(rename = "getMiddlewares", alias = "get_middlewares")]
    get_middlewares: Option<Vec<String>>,
    post: Option<String>,
    #[serde(rename = "postMiddlewares", alias = "post_middlewares")]
    post_middlewares: Option<Vec<String>>,
    put: Option<String>,
    #[serde(rename = "putMiddlewares", alias = "put_middlewares")]
    put_middlewares: Option<Vec<String>>,
    patch: Option<String>,
    #[serde(rename = "patchMiddlewares", alias = "patch_middlewares")]
    patch_middlewares: Option<Vec<String>>,
    delete: Option<String>,
    #[serde(rename = "deleteMiddlewares", alias = "delete_middlewares")]
    delete_middlewares: Option<Vec<String>>,
}

impl RawDescriptor {
    /// Takes the middleware list and handler declared for `method`.
    fn take_method(&mut self, method: &Method) -> (Option<Vec<String>>, Option<String>) {
        match method.as_str() {
            "GET" => (self.get_middlewares.take(), self.get.take()),
            "POST" => (self.post_middlewares.take(), self.post.take()),
            "PUT" => (self.put_middlewares.take(), self.put.take()),
            "PATCH" => (self.patch_middlewares.take(), self.patch.take()),
            "DELETE" => (self.delete_middlewares.take(), self.delete.take()),
            _ => (None, None),
        }
    }

    fn into_descriptor(mut self) -> Result<RouteDescriptor, LoadError> {
        let paths = match self.path.take() {
            None => None,
            Some(RawPath::One(p)) => Some(vec![p]),
            Some(RawPath::Many(list)) => Some(list),
        };
        if let Some(paths) = &paths {
            if paths.is_empty() {
                return Err(LoadError::InvalidDescriptor("path list is empty".into()));
            }
            for path in paths {
                check_route_path(path).map_err(LoadError::InvalidDescriptor)?;
            }
        }

        let methods = SUPPORTED_METHODS
            .iter()
            .filter_map(|method| match self.take_method(method) {
                (None, None) => None,
                (mws, handler) => Some(MethodSpec {
                    method: method.clone(),
                    middlewares: mws.unwrap_or_default(),
                    handler,
                }),
            })
            .collect();

        Ok(RouteDescriptor { enabled: self.enabled.unwrap_or(true), paths, methods })
    }
}

/// Parses a descriptor from TOML text.
pub fn parse_toml(text: &str) -> Result<RouteDescriptor, LoadError> {
    toml::from_str::<RawDescriptor>(text)?.into_descriptor()
}

/// Parses a descriptor from JSON text.
pub fn parse_json(text: &str) -> Result<RouteDescriptor, LoadError> {
    serde_json::from_str::<RawDescriptor>(text)?.into_descriptor()
}

/// Turns a file path into a [`RouteDescriptor`].
#[async_trait]
pub trait DescriptorProvider: Send + Sync {
    async fn load(&self, path: &Path) -> Result<RouteDescriptor, LoadError>;
}

/// Reads descriptor files from disk, choosing the parser by file extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileDescriptorProvider;

#[async_trait]
impl DescriptorProvider for FileDescriptorProvider {
    async fn load(&self, path: &Path) -> Result<RouteDescriptor, LoadError> {
        let ext = path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase());
        let parse: fn(&str) -> Result<RouteDescriptor, LoadError> = match ext.as_deref() {
            Some("toml") => parse_toml,
            Some("json") => parse_json,
            _ => return Err(LoadError::UnsupportedFormat(ext.clone())),
        };
        let text = tokio::fs::read_to_string(path).await?;
        parse(&text)
    }
}
