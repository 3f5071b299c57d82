use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use std::io;
use tokio::time::{Duration, Instant};

use super::ResponseWriter;

/// In-memory writer for schedule tests. Records when each chunk arrived relative to
/// creation, and can be told to fail on a given write to simulate a dropped peer.
pub(crate) struct RecordingWriter {
    started: Instant,
    pub status: Option<StatusCode>,
    pub headers: HeaderMap,
    pub committed_at: Option<Duration>,
    pub chunks: Vec<(Duration, Bytes)>,
    pub flushes: usize,
    fail_on_write: Option<usize>,
    writes: usize,
}

impl RecordingWriter {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            status: None,
            headers: HeaderMap::new(),
            committed_at: None,
            chunks: Vec::new(),
            flushes: 0,
            fail_on_write: None,
            writes: 0,
        }
    }

    /// Fails the `nth` write (1-based) and every write after it.
    pub fn failing_on(nth: usize) -> Self {
        Self {
            fail_on_write: Some(nth),
            ..Self::new()
        }
    }

    pub fn body(&self) -> Vec<u8> {
        self.chunks
            .iter()
            .flat_map(|(_, chunk)| chunk.iter().copied())
            .collect()
    }

    pub fn chunk_sizes(&self) -> Vec<usize> {
        self.chunks.iter().map(|(_, chunk)| chunk.len()).collect()
    }

    fn commit(&mut self) {
        if self.committed_at.is_none() {
            self.committed_at = Some(self.started.elapsed());
        }
    }
}

#[async_trait]
impl ResponseWriter for RecordingWriter {
    fn set_status(&mut self, status: StatusCode) {
        if self.committed_at.is_none() {
            self.status = Some(status);
        }
    }

    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        if self.committed_at.is_none() {
            self.headers.insert(name, value);
        }
    }

    async fn write(&mut self, chunk: Bytes) -> io::Result<()> {
        self.writes += 1;
        if self.fail_on_write.is_some_and(|nth| self.writes >= nth) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer went away"));
        }
        self.commit();
        self.chunks.push((self.started.elapsed(), chunk));
        Ok(())
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.commit();
        self.flushes += 1;
        Ok(())
    }
}
