use axum::{
    body::to_bytes,
    extract::Request,
    http::header::CONTENT_LENGTH,
    response::{IntoResponse, Response},
    Json,
};
use http_body_util::LengthLimitError;
use serde_json::json;

use crate::error::HttpError;

/// Largest body the echo handler will buffer.
pub const ECHO_BODY_LIMIT: usize = 1024 * 1024;

/// Reflects the request back as JSON: method, URI and the body as UTF-8 text.
pub async fn echo(req: Request) -> Response {
    let (parts, body) = req.into_parts();

    // Early rejection when the declared length is already over the limit
    let declared = parts
        .headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > ECHO_BODY_LIMIT) {
        return HttpError::PayloadTooLarge { limit: ECHO_BODY_LIMIT }.into_response();
    }

    let bytes = match to_bytes(body, ECHO_BODY_LIMIT).await {
        Ok(b) => b,
        Err(e) => {
            let source = e.into_inner();
            if source.downcast_ref::<LengthLimitError>().is_some() {
                return HttpError::PayloadTooLarge { limit: ECHO_BODY_LIMIT }.into_response();
            }
            return HttpError::BadRequest(format!("failed to read body: {}", source)).into_response();
        }
    };
    Json(json!({
        "method": parts.method.as_str(),
        "uri": parts.uri.to_string(),
        "body": String::from_utf8_lossy(&bytes),
    }))
    .into_response()
}
