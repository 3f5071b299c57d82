use axum::body::Body;
use axum::response::{IntoResponse, Response};
use http::header::CONTENT_TYPE;
use http::{HeaderValue, StatusCode};
use http_body_util::{Empty, Full};
use serde::Serialize;

use crate::errors::ApiError;

const JSON_UTF8: &str = "application/json; charset=UTF-8";
const TEXT_UTF8: &str = "text/plain; charset=UTF-8";

pub fn empty() -> Body {
    Body::new(Empty::<bytes::Bytes>::new())
}

pub fn full<T: Into<bytes::Bytes>>(chunk: T) -> Body {
    Body::new(Full::new(chunk.into()))
}

/// Plain-text response, the shape every client-facing error message takes.
pub fn text(status: StatusCode, message: impl Into<String>) -> Response {
    let mut response = (status, full(message.into())).into_response();
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_UTF8));
    response
}

/// Two-space indented JSON followed by a newline.
pub fn pretty_json<T: Serialize>(value: &T) -> Result<Response, ApiError> {
    let mut encoded = serde_json::to_vec_pretty(value).map_err(|err| {
        probe_trace::error!("failed to encode response body: {}", err);
        ApiError::Internal
    })?;
    encoded.push(b'\n');

    let mut response = (StatusCode::OK, full(encoded)).into_response();
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8));
    Ok(response)
}
