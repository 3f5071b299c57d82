use axum::extract::{Path, Query, State};
use axum::response::Response;
use http::header::{
    ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, ETAG, RANGE,
};
use http::{HeaderMap, HeaderValue};
use probe_shaping::delivery::{
    stream_range, RangeStreamPlan, ResponseWriter, DEFAULT_RANGE_CHUNK_SIZE,
};
use probe_shaping::range;

use crate::errors::ApiError;
use crate::params::{number_or, QueryMap};
use crate::state::SharedState;
use crate::writer::{spawn_delivery, streaming_response};

/// `/range/{numbytes}`: serves the alphabet resource of `numbytes` bytes, honouring a
/// single `Range` header and pacing the body over `duration` seconds.
pub async fn range(
    State(state): State<SharedState>,
    Path(numbytes): Path<String>,
    Query(query): Query<QueryMap>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let max = state.limits.max_range_bytes;
    let numbytes = numbytes
        .parse::<i64>()
        .map_err(|_| ApiError::InvalidArgument(String::from("invalid number of bytes")))?;
    let total = u64::try_from(numbytes)
        .ok()
        .filter(|total| (1..=max).contains(total))
        .ok_or(ApiError::RangeOutOfBounds { numbytes, max })?;

    let default_chunk = i64::try_from(DEFAULT_RANGE_CHUNK_SIZE).unwrap_or(i64::MAX);
    let chunk_size = number_or(&query, "chunk_size", default_chunk)?;
    let duration = number_or(&query, "duration", 0.0_f64)?;

    let requested = headers.get(RANGE).and_then(|value| value.to_str().ok());
    let window = range::resolve(requested, total)?;
    let duration = if duration.is_nan() {
        0.0
    } else {
        duration.min(state.limits.max_stream_duration_secs)
    };
    let plan = RangeStreamPlan::new(window, chunk_size, duration);

    let (mut writer, pending) = streaming_response();
    writer.set_status(window.status());
    writer.set_header(CONTENT_TYPE, HeaderValue::from_static("application/octet-stream"));
    writer.set_header(ETAG, header_value(&format!("range{total}"))?);
    writer.set_header(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    writer.set_header(CONTENT_LENGTH, HeaderValue::from(window.len()));
    writer.set_header(CONTENT_RANGE, header_value(&window.content_range())?);

    spawn_delivery("range", async move { stream_range(&plan, &mut writer).await });
    pending.into_response().await
}

fn header_value(value: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(value).map_err(|_| ApiError::Internal)
}
