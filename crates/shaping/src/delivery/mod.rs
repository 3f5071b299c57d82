//! Timed, incremental body delivery.
//!
//! WHY: Clients under test need bodies that arrive slowly, in known chunk sizes, so
//! their timeouts, progress reporting and partial-read handling can be exercised.
//!
//! WHAT: Three schedules sharing one contract: every write is followed by a flush,
//! offsets only ever increase, and the first failed write or flush ends the stream.
//! - [`drip`]: a fixed number of `*` bytes spread over a duration.
//! - [`stream_range`]: a byte window of the alphabet resource, paced per byte.
//! - [`stream_bytes`]: an in-memory payload cut into fixed chunks, unpaced.
//!
//! HOW: Schedules drive a [`ResponseWriter`] from a single task and wait between
//! chunks with `tokio::time::sleep`, so only that task is parked.

mod burst;
mod drip;
mod range_stream;

#[cfg(test)]
pub(crate) mod recorder;

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderName, HeaderValue, StatusCode};
use std::io;
use thiserror::Error;

pub use burst::{stream_bytes, DEFAULT_STREAM_CHUNK_SIZE};
pub use drip::{drip, DripBounds, DripCadence, DripParams, DripPlan, DRIP_TICK};
pub use range_stream::{stream_range, RangeStreamPlan, DEFAULT_RANGE_CHUNK_SIZE};

/// Response-writer capability handed to the schedules.
///
/// The status line and headers are committed by the first `write` or `flush`; header
/// changes after that point cannot reach the client.
#[async_trait]
pub trait ResponseWriter: Send {
    fn set_status(&mut self, status: StatusCode);

    fn set_header(&mut self, name: HeaderName, value: HeaderValue);

    /// Hands `chunk` to the connection. Fails once the peer is gone.
    async fn write(&mut self, chunk: Bytes) -> io::Result<()>;

    /// Commits the head if needed and pushes buffered bytes out.
    async fn flush(&mut self) -> io::Result<()>;
}

/// A stream ended early because the connection failed. Headers are already on the
/// wire, so this only ever truncates the body.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("stream aborted after {written} bytes: {source}")]
    Io {
        written: u64,
        #[source]
        source: io::Error,
    },
}

impl DeliveryError {
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        match self {
            Self::Io { written, .. } => *written,
        }
    }
}

/// What a finished schedule put on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub bytes_written: u64,
    pub chunks: u64,
}

/// Write-then-flush helper that keeps the running report and turns the first I/O
/// failure into a [`DeliveryError`].
pub(crate) struct Emitter<'a, W: ResponseWriter + ?Sized> {
    writer: &'a mut W,
    report: DeliveryReport,
}

impl<'a, W: ResponseWriter + ?Sized> Emitter<'a, W> {
    pub(crate) fn new(writer: &'a mut W) -> Self {
        Self {
            writer,
            report: DeliveryReport::default(),
        }
    }

    pub(crate) async fn commit(&mut self) -> Result<(), DeliveryError> {
        let written = self.report.bytes_written;
        self.writer
            .flush()
            .await
            .map_err(|source| DeliveryError::Io { written, source })
    }

    pub(crate) async fn emit(&mut self, chunk: Bytes) -> Result<(), DeliveryError> {
        let len = chunk.len() as u64;
        let written = self.report.bytes_written;

        self.writer
            .write(chunk)
            .await
            .map_err(|source| DeliveryError::Io { written, source })?;

        self.report.bytes_written += len;
        self.report.chunks += 1;

        self.commit().await
    }

    pub(crate) fn finish(self) -> DeliveryReport {
        self.report
    }
}
