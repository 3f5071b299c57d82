use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::HeaderValue;
use probe_shaping::delivery::{self, ResponseWriter, DEFAULT_STREAM_CHUNK_SIZE};
use probe_shaping::payload;
use std::time::Duration;

use crate::body;
use crate::echo::Echo;
use crate::errors::ApiError;
use crate::params::{count, number_or, seed, QueryMap};
use crate::state::SharedState;
use crate::writer::{spawn_delivery, streaming_response};

const OCTET_STREAM: &str = "application/octet-stream";

/// `/get`
pub async fn get(echo: Echo) -> Echo {
    echo
}

/// `/delay/{n}`: sleeps `n` seconds, capped by the configured maximum, then echoes.
pub async fn delay(
    State(state): State<SharedState>,
    Path(seconds): Path<String>,
    echo: Echo,
) -> Result<Echo, ApiError> {
    let seconds = count(&seconds, "invalid number of delay")?;
    let cap = Duration::try_from_secs_f64(state.limits.max_delay_secs).unwrap_or_default();
    tokio::time::sleep(Duration::from_secs(seconds).min(cap)).await;
    Ok(echo)
}

fn byte_count(state: &SharedState, segment: &str) -> Result<usize, ApiError> {
    let n = count(segment, "invalid number of bytes")?.min(state.limits.max_range_bytes);
    usize::try_from(n).map_err(|_| ApiError::Internal)
}

/// `/bytes/{n}`: `n` random bytes, reproducible when `seed` is given.
pub async fn bytes(
    State(state): State<SharedState>,
    Path(n): Path<String>,
    Query(query): Query<QueryMap>,
) -> Result<Response, ApiError> {
    let n = byte_count(&state, &n)?;
    let payload = payload::random_bytes(n, seed(&query));

    let mut response = body::full(payload).into_response();
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(OCTET_STREAM));
    Ok(response)
}

/// `/stream-bytes/{n}`: the same bytes as `/bytes/{n}`, flushed in `chunk_size`
/// pieces.
pub async fn stream_bytes(
    State(state): State<SharedState>,
    Path(n): Path<String>,
    Query(query): Query<QueryMap>,
) -> Result<Response, ApiError> {
    let n = byte_count(&state, &n)?;
    let chunk_size = number_or(&query, "chunk_size", DEFAULT_STREAM_CHUNK_SIZE)?;
    let payload = payload::random_bytes(n, seed(&query));

    let (mut writer, pending) = streaming_response();
    writer.set_header(CONTENT_TYPE, HeaderValue::from_static(OCTET_STREAM));
    writer.set_header(CONTENT_LENGTH, HeaderValue::from(payload.len()));

    spawn_delivery("stream-bytes", async move {
        delivery::stream_bytes(payload, chunk_size, &mut writer).await
    });
    pending.into_response().await
}
