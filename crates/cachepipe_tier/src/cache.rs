// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The contract for a shared distributed cache tier.
//!
//! [`DistributedCache`] is the narrow interface the pipeline uses to talk to a
//! remote key/value tier. Keys are strings, values are opaque bytes, and every
//! operation is batched so one pipeline flush costs one round trip.

use std::time::Duration;

use bytes::Bytes;

use crate::Error;

/// A single write issued to a [`DistributedCache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheWrite {
    /// The storage key.
    pub key: String,
    /// The payload to store.
    pub value: Bytes,
    /// How long the entry should live. `None` defers to the tier's own policy.
    pub ttl: Option<Duration>,
}

impl CacheWrite {
    /// Creates a write without a TTL.
    pub fn new(key: impl Into<String>, value: impl Into<Bytes>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            ttl: None,
        }
    }

    /// Sets the TTL of this write.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Trait for distributed cache tiers.
///
/// Implementations must be safe for concurrent use from many sessions.
///
/// `bulk_get` answers positionally: element `i` of the result belongs to
/// `keys[i]`, and `None` marks a miss. Returning a vector of a different length
/// is treated by callers as a transport failure.
///
/// `bulk_set` is best-effort from the caller's point of view; a failure is
/// logged but never fails a lookup.
#[dynosaur::dynosaur(pub(crate) DynDistributedCache = dyn(box) DistributedCache, bridge(none))]
pub trait DistributedCache: Send + Sync {
    /// Reads every key in one round trip.
    fn bulk_get(&self, keys: &[String]) -> impl Future<Output = Result<Vec<Option<Bytes>>, Error>> + Send;

    /// Writes every entry in one round trip.
    fn bulk_set(&self, entries: Vec<CacheWrite>) -> impl Future<Output = Result<(), Error>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_write_with_ttl() {
        let write = CacheWrite::new("k", Bytes::from_static(b"v")).with_ttl(Some(Duration::from_secs(5)));
        assert_eq!(write.key, "k");
        assert_eq!(write.value, Bytes::from_static(b"v"));
        assert_eq!(write.ttl, Some(Duration::from_secs(5)));
    }
}
