use std::time::Duration;

use super::{DeliveryError, DeliveryReport, Emitter, ResponseWriter};
use crate::payload::alphabet_chunk;
use crate::range::ByteRange;

/// Chunk size used when `/range` is called without `chunk_size`.
pub const DEFAULT_RANGE_CHUNK_SIZE: u64 = 10 << 10;

const MAX_DURATION_SECS: f64 = 60.0;

/// Paced streaming of one resolved window of the alphabet resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeStreamPlan {
    window: ByteRange,
    chunk_size: u64,
    duration_ms: u64,
}

impl RangeStreamPlan {
    /// `chunk_size` below one becomes one; `duration_secs` is clamped to `[0, 60]`
    /// with NaN treated as zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(window: ByteRange, chunk_size: i64, duration_secs: f64) -> Self {
        let duration_secs = if duration_secs.is_nan() {
            0.0
        } else {
            duration_secs.clamp(0.0, MAX_DURATION_SECS)
        };

        Self {
            window,
            chunk_size: u64::try_from(chunk_size).unwrap_or(0).max(1),
            duration_ms: (duration_secs * 1000.0).round() as u64,
        }
    }

    #[must_use]
    pub fn window(&self) -> ByteRange {
        self.window
    }

    #[must_use]
    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Wait owed before a chunk of `chunk_len` bytes: the duration shared out evenly
    /// per byte of the window.
    #[must_use]
    pub fn pause_for(&self, chunk_len: u64) -> Duration {
        let nanos = u128::from(self.duration_ms) * 1_000_000 * u128::from(chunk_len)
            / u128::from(self.window.len());
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

/// Streams `plan.window()` in `chunk_size` pieces, sleeping before each write so the
/// whole window takes roughly the plan's duration. The head is committed before the
/// first pause.
///
/// # Errors
///
/// [`DeliveryError::Io`] on the first failed write or flush; nothing is written after.
pub async fn stream_range<W: ResponseWriter + ?Sized>(
    plan: &RangeStreamPlan,
    writer: &mut W,
) -> Result<DeliveryReport, DeliveryError> {
    let window = plan.window();
    let mut emitter = Emitter::new(writer);
    emitter.commit().await?;

    let mut cursor = window.start;
    while cursor <= window.end {
        let len = plan.chunk_size().min(window.end - cursor + 1);
        tokio::time::sleep(plan.pause_for(len)).await;

        emitter
            .emit(alphabet_chunk(
                cursor,
                usize::try_from(len).unwrap_or(usize::MAX),
            ))
            .await?;
        cursor += len;
    }

    let report = emitter.finish();
    probe_trace::debug!(
        "range {} streamed {} bytes in {} chunks",
        window.content_range(),
        report.bytes_written,
        report.chunks
    );
    Ok(report)
}
