use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure while loading a single descriptor file.
///
/// These are recoverable: the loader logs them and moves on to the next file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read descriptor: {0}")]
    Io(#[from] std::io::Error),
    /// The file content is not a valid descriptor document.
    #[error("failed to parse descriptor: {0}")]
    Parse(String),
    /// The provider has no parser for this file extension.
    #[error("unsupported descriptor format: {0:?}")]
    UnsupportedFormat(Option<String>),
    /// The document parsed but its routing data is unusable.
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),
    /// A terminal handler name is not present in the handler registry.
    #[error("unknown handler '{0}'")]
    UnknownHandler(String),
    /// A middleware name is not present in the handler registry.
    #[error("unknown middleware '{0}'")]
    UnknownMiddleware(String),
}

impl From<toml::de::Error> for LoadError {
    fn from(err: toml::de::Error) -> Self {
        LoadError::Parse(err.message().to_string())
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        LoadError::Parse(err.to_string())
    }
}

/// Failure that aborts a whole `load_routes` call.
#[derive(Debug, Error)]
pub enum ScanError {
    /// A directory under the root could not be enumerated.
    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// An exclude pattern does not compile.
    #[error("invalid exclude pattern: {0}")]
    InvalidGlob(#[from] globset::Error),
    /// The blocking directory walk did not finish.
    #[error("directory walk task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<walkdir::Error> for ScanError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(PathBuf::from).unwrap_or_default();
        let source = match err.into_io_error() {
            Some(io) => io,
            None => std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop detected"),
        };
        ScanError::ReadDir { path, source }
    }
}

/// Error responses produced by the built-in handlers and middlewares.
#[derive(Debug)]
pub enum HttpError {
    Unauthorized(String),
    BadRequest(String),
    PayloadTooLarge { limit: usize },
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, error_code, error_message, details) = match self {
            HttpError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg, None),
            HttpError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg, None),
            HttpError::PayloadTooLarge { limit } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                format!("Request body exceeds maximum size of {} bytes", limit),
                Some(json!({ "limit": limit })),
            ),
        };

        let mut body = json!({
            "error": {
                "code": error_code,
                "message": error_message,
            },
            "status": status.as_u16(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        if let Some(details) = details {
            body["error"]["details"] = details;
        }

        (status, Json(body)).into_response()
    }
}
