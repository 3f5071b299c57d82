use bytes::Bytes;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Byte used for drip bodies.
pub const FILLER_BYTE: u8 = b'*';

/// `len` filler bytes.
#[must_use]
pub fn filler(len: usize) -> Bytes {
    Bytes::from(vec![FILLER_BYTE; len])
}

/// The slice `[offset, offset + len)` of the endless `abc...xyzabc...` sequence, so
/// any window of a range resource can be produced without the bytes before it.
#[must_use]
pub fn alphabet_chunk(offset: u64, len: usize) -> Bytes {
    (offset..offset + len as u64)
        .map(|position| b'a' + u8::try_from(position % 26).unwrap_or(0))
        .collect::<Vec<u8>>()
        .into()
}

/// `n` random bytes. A seed makes the output reproducible; the generator lives only
/// for this call so concurrent requests never share or reseed state.
#[must_use]
pub fn random_bytes(n: usize, seed: Option<u64>) -> Bytes {
    let mut buffer = vec![0u8; n];
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed).fill_bytes(&mut buffer),
        None => rand::rng().fill_bytes(&mut buffer),
    }
    buffer.into()
}
