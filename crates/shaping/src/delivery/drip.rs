use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderValue, StatusCode};
use std::time::Duration;

use super::{DeliveryError, DeliveryReport, Emitter, ResponseWriter};
use crate::payload::filler;
use crate::weighted::parse_code;
use crate::ShapingResult;

const DRIP_TICK_MS: u64 = 100;

/// Pause between chunks when the body is dripped in multi-byte chunks.
pub const DRIP_TICK: Duration = Duration::from_millis(DRIP_TICK_MS);

/// Raw `/drip` query values, before clamping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DripParams {
    /// Seconds over which the body is spread.
    pub duration: f64,
    pub numbytes: i64,
    pub code: i64,
    /// Seconds to wait before the status line is sent.
    pub delay: f64,
}

impl Default for DripParams {
    fn default() -> Self {
        Self {
            duration: 2.0,
            numbytes: 10,
            code: 200,
            delay: 2.0,
        }
    }
}

/// Clamp bounds for [`DripPlan`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DripBounds {
    pub max_delay_secs: f64,
    pub min_duration_secs: f64,
    pub max_duration_secs: f64,
    pub max_bytes: u64,
}

impl Default for DripBounds {
    fn default() -> Self {
        Self {
            max_delay_secs: 10.0,
            min_duration_secs: 0.1,
            max_duration_secs: 60.0,
            max_bytes: 10 << 20,
        }
    }
}

/// How the body of a [`DripPlan`] is cut up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DripCadence {
    /// One byte per write, `pause` after each.
    PerByte { pause: Duration },
    /// `chunk_size` bytes per write (the last one shorter), `pause` after each.
    Chunked { chunk_size: u64, pause: Duration },
}

/// Clamped, validated drip schedule. Durations are kept in whole milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DripPlan {
    delay_ms: u64,
    duration_ms: u64,
    num_bytes: u64,
    status: StatusCode,
}

impl DripPlan {
    /// Clamps `params` into the default bounds.
    ///
    /// # Errors
    ///
    /// [`crate::ShapingError::InvalidArgument`] when `code` is not in `[100, 599]`.
    pub fn clamped(params: DripParams) -> ShapingResult<Self> {
        Self::clamped_within(params, &DripBounds::default())
    }

    /// Clamps delay to `[0, max_delay]`, duration to `[min_duration, max_duration]`
    /// and the byte count to `[0, max_bytes]`. NaN clamps to the lower bound.
    ///
    /// # Errors
    ///
    /// [`crate::ShapingError::InvalidArgument`] when `code` is not in `[100, 599]`.
    pub fn clamped_within(params: DripParams, bounds: &DripBounds) -> ShapingResult<Self> {
        let status = parse_code(&params.code.to_string())?;

        let delay = clamp_secs(params.delay, 0.0, bounds.max_delay_secs);
        let duration = clamp_secs(
            params.duration,
            bounds.min_duration_secs,
            bounds.max_duration_secs,
        );
        let num_bytes = u64::try_from(params.numbytes)
            .unwrap_or(0)
            .min(bounds.max_bytes);

        Ok(Self {
            delay_ms: secs_to_ms(delay),
            duration_ms: secs_to_ms(duration),
            num_bytes,
            status,
        })
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    #[must_use]
    pub fn num_bytes(&self) -> u64 {
        self.num_bytes
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The body is split into `ceil(duration / 100ms)` roughly equal chunks. When that
    /// leaves one byte per chunk the bytes are spaced evenly over the duration
    /// instead.
    #[must_use]
    pub fn cadence(&self) -> DripCadence {
        if self.num_bytes == 0 {
            return DripCadence::Chunked {
                chunk_size: 0,
                pause: DRIP_TICK,
            };
        }

        let ticks = self.duration_ms.div_ceil(DRIP_TICK_MS).max(1);
        let chunk_size = self.num_bytes.div_ceil(ticks);

        if chunk_size == 1 {
            // num_bytes <= ticks <= 600 here
            let pause = u32::try_from(self.num_bytes)
                .map_or(DRIP_TICK, |bytes| self.duration() / bytes);
            return DripCadence::PerByte { pause };
        }

        DripCadence::Chunked {
            chunk_size,
            pause: DRIP_TICK,
        }
    }
}

fn clamp_secs(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() || value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn secs_to_ms(secs: f64) -> u64 {
    (secs * 1000.0).round() as u64
}

/// Waits out the plan's delay, commits status and headers, then drips the body.
///
/// # Errors
///
/// [`DeliveryError::Io`] on the first failed write or flush; nothing is written after.
pub async fn drip<W: ResponseWriter + ?Sized>(
    plan: &DripPlan,
    writer: &mut W,
) -> Result<DeliveryReport, DeliveryError> {
    tokio::time::sleep(plan.delay()).await;

    writer.set_status(plan.status());
    writer.set_header(
        CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    writer.set_header(CONTENT_LENGTH, HeaderValue::from(plan.num_bytes()));

    let mut emitter = Emitter::new(writer);
    emitter.commit().await?;

    match plan.cadence() {
        DripCadence::PerByte { pause } => {
            for _ in 0..plan.num_bytes() {
                emitter.emit(filler(1)).await?;
                tokio::time::sleep(pause).await;
            }
        }
        DripCadence::Chunked { chunk_size, pause } => {
            let mut remaining = plan.num_bytes();
            while remaining > 0 {
                let len = remaining.min(chunk_size);
                emitter
                    .emit(filler(usize::try_from(len).unwrap_or(usize::MAX)))
                    .await?;
                tokio::time::sleep(pause).await;
                remaining -= len;
            }
        }
    }

    let report = emitter.finish();
    probe_trace::debug!(
        "drip delivered {} bytes in {} chunks",
        report.bytes_written,
        report.chunks
    );
    Ok(report)
}
