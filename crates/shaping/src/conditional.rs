//! Conditional request evaluation for the cache validation endpoints.
//!
//! Validator headers are compared by plain substring containment. `If-None-Match:
//! "a", "b"` matches a resource etag of `a` because the raw header contains it; no
//! entity-tag list parsing or weak/strong comparison takes place.

use chrono::{DateTime, Utc};
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::header::{
    CACHE_CONTROL, ETAG, IF_MATCH, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED,
};
use rand::Rng;

use crate::{ShapingError, ShapingResult};

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";
const ANY_ETAG: &str = "*";

/// Validator values taken from a request, plus the etag the resource claims to have.
///
/// Empty header values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheValidators {
    pub resource_etag: Option<String>,
    pub if_match: Option<String>,
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
}

impl CacheValidators {
    #[must_use]
    pub fn from_headers(headers: &HeaderMap, resource_etag: Option<&str>) -> Self {
        Self {
            resource_etag: resource_etag.map(String::from),
            if_match: header_text(headers, &IF_MATCH),
            if_none_match: header_text(headers, &IF_NONE_MATCH),
            if_modified_since: header_text(headers, &IF_MODIFIED_SINCE),
        }
    }
}

fn header_text(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(String::from)
}

/// Outcome of a conditional check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheDecision {
    /// First visit: serve content stamped with a brand new validator.
    Fresh {
        etag: String,
        last_modified: String,
    },
    /// Serve content carrying the resource etag.
    Serve { etag: String },
    /// 304 with an empty body, echoing the etag when one is known.
    NotModified { etag: Option<String> },
    /// 412 with an empty body.
    PreconditionFailed,
}

impl CacheDecision {
    /// Writes the validator headers this decision carries.
    ///
    /// # Errors
    ///
    /// [`ShapingError::InvalidArgument`] when an etag cannot be sent as a header value.
    pub fn apply_headers(&self, headers: &mut HeaderMap) -> ShapingResult<()> {
        match self {
            Self::Fresh {
                etag,
                last_modified,
            } => {
                headers.insert(ETAG, header_value(etag)?);
                headers.insert(LAST_MODIFIED, header_value(last_modified)?);
            }
            Self::Serve { etag }
            | Self::NotModified {
                etag: Some(etag), ..
            } => {
                headers.insert(ETAG, header_value(etag)?);
            }
            Self::NotModified { etag: None } | Self::PreconditionFailed => {}
        }
        Ok(())
    }
}

fn header_value(value: &str) -> ShapingResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| ShapingError::invalid("invalid etag"))
}

/// Freshness check: a request without `If-Modified-Since` and `If-None-Match` is
/// treated as uncached and gets a new validator; any request carrying either is told
/// its copy is still good.
#[must_use]
pub fn freshness(validators: &CacheValidators, now: DateTime<Utc>) -> CacheDecision {
    if validators.if_modified_since.is_none() && validators.if_none_match.is_none() {
        return CacheDecision::Fresh {
            etag: new_validator_token(),
            last_modified: http_date(now),
        };
    }
    CacheDecision::NotModified { etag: None }
}

/// Explicit-etag check against `validators.resource_etag` (empty when absent).
///
/// `If-None-Match` wins when it contains the etag or is `*`; otherwise `If-Match`
/// fails the request unless it contains the etag or is `*`.
#[must_use]
pub fn etag_check(validators: &CacheValidators) -> CacheDecision {
    let etag = validators.resource_etag.clone().unwrap_or_default();

    if let Some(if_none_match) = &validators.if_none_match {
        if if_none_match.contains(etag.as_str()) || if_none_match == ANY_ETAG {
            return CacheDecision::NotModified { etag: Some(etag) };
        }
    }

    if let Some(if_match) = &validators.if_match {
        if !if_match.contains(etag.as_str()) && if_match != ANY_ETAG {
            return CacheDecision::PreconditionFailed;
        }
    }

    CacheDecision::Serve { etag }
}

/// `Cache-Control` value for `/cache/{seconds}`.
///
/// # Errors
///
/// [`ShapingError::InvalidArgument`] unless `seconds` is a non-negative integer.
pub fn cache_control(seconds: &str) -> ShapingResult<(HeaderName, HeaderValue)> {
    let max_age = seconds
        .parse::<u64>()
        .map_err(|_| ShapingError::invalid("invalid number of seconds"))?;
    let value = HeaderValue::from_str(&format!("public, max-age={max_age}"))
        .map_err(|_| ShapingError::invalid("invalid number of seconds"))?;
    Ok((CACHE_CONTROL, value))
}

/// 128 random bits as lowercase hex, unique per call.
#[must_use]
pub fn new_validator_token() -> String {
    format!("{:032x}", rand::rng().random::<u128>())
}

/// IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
#[must_use]
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format(HTTP_DATE_FORMAT).to_string()
}
