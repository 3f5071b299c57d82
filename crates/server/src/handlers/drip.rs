use axum::extract::{Query, State};
use axum::response::Response;
use probe_shaping::delivery::{self, DripParams, DripPlan};

use crate::errors::ApiError;
use crate::params::{number_or, QueryMap};
use crate::state::SharedState;
use crate::writer::{spawn_delivery, streaming_response};

/// `/drip`: waits `delay` seconds, then sends `numbytes` filler bytes over `duration`
/// seconds with status `code`.
pub async fn drip(
    State(state): State<SharedState>,
    Query(query): Query<QueryMap>,
) -> Result<Response, ApiError> {
    let defaults = DripParams::default();
    let params = DripParams {
        duration: number_or(&query, "duration", defaults.duration)?,
        numbytes: number_or(&query, "numbytes", defaults.numbytes)?,
        code: number_or(&query, "code", defaults.code)?,
        delay: number_or(&query, "delay", defaults.delay)?,
    };
    let plan = DripPlan::clamped_within(params, &state.drip_bounds())?;

    probe_trace::debug!(
        "drip {} bytes over {:?} after {:?}",
        plan.num_bytes(),
        plan.duration(),
        plan.delay()
    );

    let (mut writer, pending) = streaming_response();
    spawn_delivery("drip", async move { delivery::drip(&plan, &mut writer).await });
    pending.into_response().await
}
