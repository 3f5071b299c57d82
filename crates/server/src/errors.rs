use axum::response::{IntoResponse, Response};
use derive_more::From;
use http::header::{ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, ETAG};
use http::{HeaderMap, HeaderValue, StatusCode};
use probe_shaping::range::unsatisfied_content_range;
use probe_shaping::ShapingError;

use crate::body;

/// Everything a handler can fail with before the response head is sent.
///
/// Once a streamed body has started, failures only truncate it and are logged
/// instead of being turned into an `ApiError`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InvalidArgument(String),
    /// `/range/{numbytes}` with a size outside `(0, max]`.
    RangeOutOfBounds { numbytes: i64, max: u64 },
    RangeNotSatisfiable { total: u64 },
    PreconditionFailed,
    NotModified { etag: Option<String> },
    Internal,
}

impl From<ShapingError> for ApiError {
    fn from(err: ShapingError) -> Self {
        match err {
            ShapingError::InvalidArgument(message) => Self::InvalidArgument(message),
            ShapingError::RangeNotSatisfiable { total } => Self::RangeNotSatisfiable { total },
            ShapingError::PreconditionFailed => Self::PreconditionFailed,
        }
    }
}

impl std::error::Error for ApiError {}

impl core::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

fn range_headers(headers: &mut HeaderMap, numbytes: impl std::fmt::Display) {
    if let Ok(value) = HeaderValue::from_str(&format!("range{numbytes}")) {
        headers.insert(ETAG, value);
    }
    headers.insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
}

fn empty_with(status: StatusCode) -> Response {
    (status, body::empty()).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidArgument(message) => body::text(StatusCode::BAD_REQUEST, message),
            Self::RangeOutOfBounds { numbytes, max } => {
                let mut response = body::text(
                    StatusCode::NOT_FOUND,
                    format!("number of bytes must be in the range (0, {max}]"),
                );
                range_headers(response.headers_mut(), numbytes);
                response
            }
            Self::RangeNotSatisfiable { total } => {
                let mut response = empty_with(StatusCode::RANGE_NOT_SATISFIABLE);
                let headers = response.headers_mut();
                range_headers(headers, total);
                if let Ok(value) = HeaderValue::from_str(&unsatisfied_content_range(total)) {
                    headers.insert(CONTENT_RANGE, value);
                }
                headers.insert(CONTENT_LENGTH, HeaderValue::from(0u64));
                response
            }
            Self::PreconditionFailed => empty_with(StatusCode::PRECONDITION_FAILED),
            Self::NotModified { etag } => {
                let mut response = empty_with(StatusCode::NOT_MODIFIED);
                if let Some(value) = etag.and_then(|etag| HeaderValue::from_str(&etag).ok()) {
                    response.headers_mut().insert(ETAG, value);
                }
                response
            }
            Self::Internal => body::text(StatusCode::INTERNAL_SERVER_ERROR, "internal error"),
        }
    }
}

/// Failures of the listener and serve loop.
#[derive(Debug, From)]
pub enum ServeError {
    #[from(ignore)]
    InvalidConfig(probe_config::ConfigError),

    Io(std::io::Error),
}

impl From<probe_config::ConfigError> for ServeError {
    fn from(value: probe_config::ConfigError) -> Self {
        Self::InvalidConfig(value)
    }
}

impl std::error::Error for ServeError {}

impl core::fmt::Display for ServeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
