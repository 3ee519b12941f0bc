// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-memory cache tier using moka.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use bytes::Bytes;
use cachepipe_tier::{CacheWrite, DistributedCache, Error};
use moka::{Expiry, future::Cache};

use crate::builder::InMemoryCacheBuilder;

#[derive(Debug, Clone)]
struct Stored {
    value: Bytes,
    ttl: Option<Duration>,
}

/// Expires each entry after the TTL it was written with, or the cache-wide default.
#[derive(Debug)]
struct PerEntryTtl {
    default_ttl: Option<Duration>,
}

impl Expiry<String, Stored> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, value: &Stored, _created_at: Instant) -> Option<Duration> {
        value.ttl.or(self.default_ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Stored,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl.or(self.default_ttl)
    }
}

/// An in-process [`DistributedCache`] backed by moka.
///
/// Clones share the same storage.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use cachepipe_memory::InMemoryCache;
/// use cachepipe_tier::{CacheWrite, DistributedCache};
/// # futures::executor::block_on(async {
///
/// let cache = InMemoryCache::new();
///
/// cache.bulk_set(vec![CacheWrite::new("key", Bytes::from_static(b"42"))]).await.unwrap();
/// let values = cache.bulk_get(&["key".to_string()]).await.unwrap();
/// assert_eq!(values, vec![Some(Bytes::from_static(b"42"))]);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryCache {
    inner: Arc<Cache<String, Stored>>,
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCache {
    /// Creates a new unbounded in-memory cache.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a new in-memory cache holding at most `max_capacity` entries.
    #[must_use]
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self::builder().max_capacity(max_capacity).build()
    }

    /// Creates a new builder for configuring an in-memory cache.
    #[must_use]
    pub fn builder() -> InMemoryCacheBuilder {
        InMemoryCacheBuilder::new()
    }

    pub(crate) fn from_builder(builder: &InMemoryCacheBuilder) -> Self {
        let mut moka_builder = Cache::builder().expire_after(PerEntryTtl {
            default_ttl: builder.time_to_live,
        });

        if let Some(capacity) = builder.max_capacity {
            moka_builder = moka_builder.max_capacity(capacity);
        }

        if let Some(capacity) = builder.initial_capacity {
            moka_builder = moka_builder.initial_capacity(capacity);
        }

        if let Some(name) = builder.name.as_deref() {
            moka_builder = moka_builder.name(name);
        }

        Self {
            inner: Arc::new(moka_builder.build()),
        }
    }

    /// Returns the approximate number of live entries.
    ///
    /// The count is eventually consistent; call [`InMemoryCache::run_pending_tasks`]
    /// first for an exact figure.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    /// Applies pending housekeeping such as evictions and expirations.
    pub async fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks().await;
    }

    /// Removes the entry for `key`, if any.
    pub async fn invalidate(&self, key: &str) {
        self.inner.invalidate(key).await;
    }
}

impl DistributedCache for InMemoryCache {
    async fn bulk_get(&self, keys: &[String]) -> Result<Vec<Option<Bytes>>, Error> {
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            values.push(self.inner.get(key.as_str()).await.map(|stored| stored.value));
        }
        Ok(values)
    }

    async fn bulk_set(&self, entries: Vec<CacheWrite>) -> Result<(), Error> {
        for entry in entries {
            self.inner
                .insert(
                    entry.key,
                    Stored {
                        value: entry.value,
                        ttl: entry.ttl,
                    },
                )
                .await;
        }
        Ok(())
    }
}
