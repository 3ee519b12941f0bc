// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{fmt, marker::PhantomData};

use bytes::Bytes;
use cachepipe_tier::{Codec, DecodeError, Error};
use serde::{Serialize, de::DeserializeOwned};

/// A [`Codec`] for any serde type, using the compact postcard wire format.
///
/// # Examples
///
/// ```
/// use cachepipe::PostcardCodec;
/// use cachepipe_tier::Codec;
///
/// let codec = PostcardCodec::<(String, u32)>::new();
/// let bytes = codec.encode(&("widget".to_string(), 3)).unwrap();
/// assert_eq!(codec.decode(&bytes).unwrap(), ("widget".to_string(), 3));
/// ```
pub struct PostcardCodec<V> {
    _marker: PhantomData<fn() -> V>,
}

impl<V> PostcardCodec<V> {
    /// Creates a new codec.
    #[must_use]
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<V> Default for PostcardCodec<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Clone for PostcardCodec<V> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for PostcardCodec<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostcardCodec").finish()
    }
}

impl<V> Codec<V> for PostcardCodec<V>
where
    V: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &V) -> Result<Bytes, Error> {
        postcard::to_allocvec(value).map(Bytes::from).map_err(Error::codec)
    }

    fn decode(&self, bytes: &[u8]) -> Result<V, DecodeError> {
        postcard::from_bytes(bytes).map_err(DecodeError::new)
    }
}
