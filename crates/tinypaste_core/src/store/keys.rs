//! Expiry index key encoding shared by the ordered-map backends.
//!
//! A key is the expiry instant as 8 big-endian bytes, followed by the paste id
//! bytes. The instant is signed nanoseconds since the Unix epoch with the sign
//! bit flipped, which shifts the origin to the start of the `i64` range
//! (1677-09-21). Byte order of keys therefore equals chronological order of
//! expiry on both sides of 1970, with the id breaking ties.

use crate::error::StoreError;
use chrono::{DateTime, Utc};

/// Width of the timestamp prefix in an expiry key.
pub const TIMESTAMP_PREFIX_LEN: usize = 8;

const SIGN_BIT: u64 = 1 << 63;

/// Order-preserving `u64` encoding of an instant.
///
/// Instants outside the `i64` nanosecond range saturate to `0` or `u64::MAX`.
/// Stored expiries never do, since [`Paste::validate`](crate::models::paste::Paste::validate)
/// rejects them.
pub fn encode_timestamp(at: DateTime<Utc>) -> u64 {
    match at.timestamp_nanos_opt() {
        Some(nanos) => (nanos as u64) ^ SIGN_BIT,
        None if at.timestamp() < 0 => 0,
        None => u64::MAX,
    }
}

/// Encoded sweep cutoff, or `None` when `before` precedes every storable
/// expiry and the sweep has nothing to do.
pub fn sweep_cutoff(before: DateTime<Utc>) -> Option<u64> {
    match before.timestamp_nanos_opt() {
        Some(_) => Some(encode_timestamp(before)),
        None if before.timestamp() < 0 => None,
        None => Some(u64::MAX),
    }
}

/// Build the composite index key for a paste expiring at `expires_at`.
pub fn expiry_key(expires_at: DateTime<Utc>, id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(TIMESTAMP_PREFIX_LEN + id.len());
    key.extend_from_slice(&encode_timestamp(expires_at).to_be_bytes());
    key.extend_from_slice(id.as_bytes());
    key
}

/// Decode the timestamp prefix of an expiry key.
///
/// # Errors
/// Returns [`StoreError::StorageMessage`] when the key is shorter than the prefix.
pub fn decode_expiry_timestamp(key: &[u8]) -> Result<u64, StoreError> {
    let prefix: [u8; TIMESTAMP_PREFIX_LEN] = key
        .get(..TIMESTAMP_PREFIX_LEN)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| {
            StoreError::StorageMessage(format!(
                "Corrupt expiry index key of {} bytes",
                key.len()
            ))
        })?;
    Ok(u64::from_be_bytes(prefix))
}
