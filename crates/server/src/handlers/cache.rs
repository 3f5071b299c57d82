use axum::extract::Path;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use http::HeaderMap;
use probe_shaping::conditional::{self, CacheDecision, CacheValidators};

use crate::echo::Echo;
use crate::errors::ApiError;

/// `/cache`: 304 when the request carries `If-Modified-Since` or `If-None-Match`,
/// otherwise the echo with a fresh `ETag` and `Last-Modified`.
pub async fn cache(headers: HeaderMap, echo: Echo) -> Result<Response, ApiError> {
    let validators = CacheValidators::from_headers(&headers, None);
    respond(conditional::freshness(&validators, Utc::now()), echo)
}

/// `/cache/{value}`: the echo with `Cache-Control: public, max-age=<value>`.
pub async fn cache_for(Path(seconds): Path<String>, echo: Echo) -> Result<Response, ApiError> {
    let (name, value) = conditional::cache_control(&seconds)?;
    let mut response = echo.into_response();
    response.headers_mut().insert(name, value);
    Ok(response)
}

/// `/etag/{etag}`: answers `If-None-Match` and `If-Match` against the etag in the path.
pub async fn etag(
    Path(etag): Path<String>,
    headers: HeaderMap,
    echo: Echo,
) -> Result<Response, ApiError> {
    let validators = CacheValidators::from_headers(&headers, Some(&etag));
    respond(conditional::etag_check(&validators), echo)
}

fn respond(decision: CacheDecision, echo: Echo) -> Result<Response, ApiError> {
    match decision {
        CacheDecision::NotModified { etag } => Err(ApiError::NotModified { etag }),
        CacheDecision::PreconditionFailed => Err(ApiError::PreconditionFailed),
        decision => {
            let mut response = echo.into_response();
            decision.apply_headers(response.headers_mut())?;
            Ok(response)
        }
    }
}
