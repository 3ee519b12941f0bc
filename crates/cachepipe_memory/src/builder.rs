// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for configuring in-memory caches.
//!
//! The builder abstracts the underlying moka configuration so that moka types
//! never leak into the public API.

use std::time::Duration;

use crate::tier::InMemoryCache;

/// Builder for configuring an [`InMemoryCache`].
///
/// # Examples
///
/// ```
/// use cachepipe_memory::InMemoryCache;
/// use std::time::Duration;
///
/// let cache = InMemoryCache::builder()
///     .max_capacity(1000)
///     .time_to_live(Duration::from_secs(300))
///     .initial_capacity(100)
///     .name("my-cache")
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct InMemoryCacheBuilder {
    pub(crate) max_capacity: Option<u64>,
    pub(crate) initial_capacity: Option<usize>,
    pub(crate) time_to_live: Option<Duration>,
    pub(crate) name: Option<String>,
}

impl InMemoryCacheBuilder {
    /// Creates a new builder with default settings.
    ///
    /// The default configuration creates an unbounded cache whose entries live
    /// until evicted, unless a write carries its own TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of entries.
    ///
    /// Once the capacity is reached, entries are evicted using the `TinyLFU`
    /// policy (LRU eviction combined with LFU admission).
    #[must_use]
    pub fn max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = Some(capacity);
        self
    }

    /// Sets the initial capacity (pre-allocation hint) for the cache.
    #[must_use]
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = Some(capacity);
        self
    }

    /// Sets the time-to-live applied to writes that carry no TTL of their own.
    ///
    /// A TTL on an individual [`CacheWrite`](cachepipe_tier::CacheWrite) always
    /// takes precedence.
    ///
    /// # Examples
    ///
    /// ```
    /// use cachepipe_memory::InMemoryCache;
    /// use std::time::Duration;
    ///
    /// let cache = InMemoryCache::builder()
    ///     .time_to_live(Duration::from_secs(300))
    ///     .build();
    /// ```
    #[must_use]
    pub fn time_to_live(mut self, duration: Duration) -> Self {
        self.time_to_live = Some(duration);
        self
    }

    /// Sets a name for the cache.
    ///
    /// This name may appear in logs or debugging output from the underlying
    /// cache implementation.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builds the configured [`InMemoryCache`].
    #[must_use]
    pub fn build(self) -> InMemoryCache {
        InMemoryCache::from_builder(&self)
    }
}
