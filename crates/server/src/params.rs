use std::collections::HashMap;
use std::str::FromStr;

use crate::errors::ApiError;

pub type QueryMap = HashMap<String, String>;

/// Parses the query parameter `name`, falling back to `default` when it is missing or
/// empty.
///
/// # Errors
///
/// [`ApiError::InvalidArgument`] when the value is present but not a `T`.
pub fn number_or<T: FromStr>(query: &QueryMap, name: &str, default: T) -> Result<T, ApiError> {
    match query.get(name).map(String::as_str) {
        None | Some("") => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| ApiError::InvalidArgument(format!("invalid value for {name}: {raw}"))),
    }
}

/// Parses a non-negative integer path segment.
///
/// # Errors
///
/// [`ApiError::InvalidArgument`] carrying `message` when the segment is not an integer
/// or is negative.
pub fn count(segment: &str, message: &str) -> Result<u64, ApiError> {
    segment
        .parse::<u64>()
        .map_err(|_| ApiError::InvalidArgument(message.to_string()))
}

/// An explicit `seed` makes random payloads reproducible. Values that are not integers
/// are ignored.
pub fn seed(query: &QueryMap) -> Option<u64> {
    query
        .get("seed")
        .and_then(|raw| raw.parse::<i64>().ok())
        .map(|seed| u64::from_ne_bytes(seed.to_ne_bytes()))
}
