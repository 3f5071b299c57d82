use bytes::Bytes;

use super::{DeliveryError, DeliveryReport, Emitter, ResponseWriter};

/// Chunk size used by `/stream-bytes` when none is given.
pub const DEFAULT_STREAM_CHUNK_SIZE: usize = 10 << 10;

/// Writes `payload` in `chunk_size` slices (minimum one byte) as fast as the
/// connection accepts them, flushing after each slice.
///
/// # Errors
///
/// [`DeliveryError::Io`] on the first failed write or flush; nothing is written after.
pub async fn stream_bytes<W: ResponseWriter + ?Sized>(
    payload: Bytes,
    chunk_size: usize,
    writer: &mut W,
) -> Result<DeliveryReport, DeliveryError> {
    let chunk_size = chunk_size.max(1);
    let mut emitter = Emitter::new(writer);
    emitter.commit().await?;

    let mut cursor = 0;
    while cursor < payload.len() {
        let end = (cursor + chunk_size).min(payload.len());
        emitter.emit(payload.slice(cursor..end)).await?;
        cursor = end;
    }

    Ok(emitter.finish())
}
