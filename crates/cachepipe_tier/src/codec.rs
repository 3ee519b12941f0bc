// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Conversion between domain values and cache payloads.

use bytes::Bytes;

use crate::Error;

/// Converts values to and from the opaque bytes stored in a distributed cache.
///
/// Encoding must be deterministic for a given value. Decoding fails with a
/// [`DecodeError`] on malformed input; callers treat such a payload as absent
/// and fall back to the backing store.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use cachepipe_tier::{Codec, DecodeError, Error};
///
/// struct Utf8;
///
/// impl Codec<String> for Utf8 {
///     fn encode(&self, value: &String) -> Result<Bytes, Error> {
///         Ok(Bytes::copy_from_slice(value.as_bytes()))
///     }
///
///     fn decode(&self, bytes: &[u8]) -> Result<String, DecodeError> {
///         String::from_utf8(bytes.to_vec()).map_err(DecodeError::new)
///     }
/// }
///
/// let bytes = Utf8.encode(&"hello".to_string()).unwrap();
/// assert_eq!(Utf8.decode(&bytes).unwrap(), "hello");
/// ```
pub trait Codec<V>: Send + Sync {
    /// Encodes `value` into a payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented.
    fn encode(&self, value: &V) -> Result<Bytes, Error>;

    /// Decodes a payload previously produced by [`Codec::encode`].
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the payload is malformed.
    fn decode(&self, bytes: &[u8]) -> Result<V, DecodeError>;
}

/// A cached payload could not be decoded.
#[derive(Debug, thiserror::Error)]
#[error("cached payload could not be decoded: {source}")]
pub struct DecodeError {
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl DecodeError {
    /// Creates a decode error from its cause.
    pub fn new(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self { source: cause.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_display_contains_cause() {
        let error = DecodeError::new("unexpected end of input");
        assert_eq!(
            error.to_string(),
            "cached payload could not be decoded: unexpected end of input"
        );
    }

    #[test]
    fn decode_error_converts_to_decode_kind() {
        let error: Error = DecodeError::new("bad tag").into();
        assert_eq!(error.kind(), crate::ErrorKind::Decode);
        assert!(error.to_string().contains("bad tag"));
    }
}
