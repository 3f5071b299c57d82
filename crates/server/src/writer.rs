//! Channel-backed [`ResponseWriter`] connecting a delivery schedule, running on its own
//! task, to the body of the response axum is sending.
//!
//! The head travels over a oneshot once the schedule commits it; body chunks travel
//! over an `mpsc` channel of capacity one, so a `write` only returns once the
//! connection has taken the previous chunk. When the client goes away hyper drops the
//! body stream, the receiver closes and the next write fails with `BrokenPipe`.

use async_trait::async_trait;
use axum::body::Body;
use axum::response::Response;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use http_body::Frame;
use http_body_util::StreamBody;
use probe_shaping::delivery::{DeliveryError, DeliveryReport, ResponseWriter};
use std::convert::Infallible;
use std::future::Future;
use std::io;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use crate::errors::ApiError;

const BODY_CHANNEL_CAPACITY: usize = 1;

struct ResponseHead {
    status: StatusCode,
    headers: HeaderMap,
}

pub struct ChannelWriter {
    status: StatusCode,
    headers: HeaderMap,
    head: Option<oneshot::Sender<ResponseHead>>,
    body: mpsc::Sender<Bytes>,
}

/// The handler's half: resolves into a response once the head is committed.
pub struct PendingResponse {
    head: oneshot::Receiver<ResponseHead>,
    body: mpsc::Receiver<Bytes>,
}

/// Creates a connected writer/response pair. The writer starts out at `200 OK` with
/// no headers.
#[must_use]
pub fn streaming_response() -> (ChannelWriter, PendingResponse) {
    let (head_tx, head_rx) = oneshot::channel();
    let (body_tx, body_rx) = mpsc::channel(BODY_CHANNEL_CAPACITY);

    (
        ChannelWriter {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            head: Some(head_tx),
            body: body_tx,
        },
        PendingResponse {
            head: head_rx,
            body: body_rx,
        },
    )
}

fn peer_gone() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "response body receiver closed")
}

impl ChannelWriter {
    fn is_committed(&self) -> bool {
        self.head.is_none()
    }

    fn commit(&mut self) -> io::Result<()> {
        if let Some(sender) = self.head.take() {
            let head = ResponseHead {
                status: self.status,
                headers: std::mem::take(&mut self.headers),
            };
            sender.send(head).map_err(|_| peer_gone())?;
        }
        Ok(())
    }
}

#[async_trait]
impl ResponseWriter for ChannelWriter {
    fn set_status(&mut self, status: StatusCode) {
        if self.is_committed() {
            probe_trace::warn!("status {} set after the head was sent, ignoring", status);
            return;
        }
        self.status = status;
    }

    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        if self.is_committed() {
            probe_trace::warn!("header {} set after the head was sent, ignoring", name);
            return;
        }
        self.headers.insert(name, value);
    }

    async fn write(&mut self, chunk: Bytes) -> io::Result<()> {
        self.commit()?;
        self.body.send(chunk).await.map_err(|_| peer_gone())
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.commit()?;
        if self.body.is_closed() {
            return Err(peer_gone());
        }
        Ok(())
    }
}

impl PendingResponse {
    /// Waits for the head and wraps the body channel as the response body.
    ///
    /// # Errors
    ///
    /// [`ApiError::Internal`] when the writer was dropped without committing.
    pub async fn into_response(self) -> Result<Response, ApiError> {
        let head = self.head.await.map_err(|_| {
            probe_trace::error!("delivery ended before sending a response head");
            ApiError::Internal
        })?;

        let frames = ReceiverStream::new(self.body)
            .map(|chunk| Ok::<_, Infallible>(Frame::data(chunk)));
        let mut response = Response::new(Body::new(StreamBody::new(frames)));
        *response.status_mut() = head.status;
        *response.headers_mut() = head.headers;
        Ok(response)
    }
}

/// Runs a delivery schedule on its own task and logs how it ended.
pub fn spawn_delivery<F>(label: &'static str, delivery: F)
where
    F: Future<Output = Result<DeliveryReport, DeliveryError>> + Send + 'static,
{
    tokio::spawn(async move {
        match delivery.await {
            Ok(report) => probe_trace::info!(
                "{} delivered {} bytes in {} chunks",
                label,
                report.bytes_written,
                report.chunks
            ),
            Err(err) => probe_trace::error!("{} aborted: {}", label, err),
        }
    });
}
