use async_trait::async_trait;
use axum::extract::{ConnectInfo, FromRequestParts, Query};
use axum::response::{IntoResponse, Response};
use http::header::HOST;
use http::request::Parts;
use http::{HeaderMap, Uri};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::net::SocketAddr;

use crate::body;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_FORWARDED_PROTO: &str = "x-forwarded-proto";
const X_REAL_IP: &str = "x-real-ip";

/// The request as the echo endpoints report it back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Echo {
    /// Query arguments; repeated keys become arrays.
    pub args: Map<String, Value>,
    /// First value of each request header, names in canonical `Title-Case`.
    pub headers: BTreeMap<String, String>,
    pub origin: String,
    pub url: String,
}

impl Echo {
    #[must_use]
    pub fn from_parts(uri: &Uri, headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        Self {
            args: args(uri),
            headers: canonical_headers(headers),
            origin: origin(headers, peer),
            url: full_url(uri, headers),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Echo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(Self::from_parts(&parts.uri, &parts.headers, peer))
    }
}

impl IntoResponse for Echo {
    fn into_response(self) -> Response {
        match body::pretty_json(&self) {
            Ok(response) => response,
            Err(err) => err.into_response(),
        }
    }
}

fn args(uri: &Uri) -> Map<String, Value> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    if let Ok(Query(pairs)) = Query::<Vec<(String, String)>>::try_from_uri(uri) {
        for (key, value) in pairs {
            grouped.entry(key).or_default().push(value);
        }
    }

    grouped
        .into_iter()
        .map(|(key, mut values)| {
            let value = if values.len() == 1 {
                Value::String(values.remove(0))
            } else {
                Value::Array(values.into_iter().map(Value::String).collect())
            };
            (key, value)
        })
        .collect()
}

/// `content-type` becomes `Content-Type`.
fn canonical_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

fn canonical_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut echoed = BTreeMap::new();
    for name in headers.keys() {
        if let Some(value) = headers.get(name).and_then(|value| value.to_str().ok()) {
            echoed.insert(canonical_name(name.as_str()), value.to_string());
        }
    }
    echoed
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// First hop of `X-Forwarded-For`, then `X-Real-IP`, then the peer address.
fn origin(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(forwarded) = header(headers, X_FORWARDED_FOR) {
        if let Some(first) = forwarded.split(',').next() {
            return first.trim().to_string();
        }
    }
    if let Some(real_ip) = header(headers, X_REAL_IP) {
        return real_ip.to_string();
    }
    peer.map(|addr| addr.ip().to_string()).unwrap_or_default()
}

fn full_url(uri: &Uri, headers: &HeaderMap) -> String {
    let scheme = header(headers, X_FORWARDED_PROTO)
        .or_else(|| uri.scheme_str())
        .unwrap_or("http");
    let host = header(headers, HOST.as_str())
        .map(String::from)
        .or_else(|| uri.authority().map(ToString::to_string))
        .unwrap_or_default();
    let path = uri
        .path_and_query()
        .map_or_else(|| uri.path().to_string(), ToString::to_string);

    format!("{scheme}://{host}{path}")
}
