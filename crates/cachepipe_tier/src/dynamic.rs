// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Type-erased, clonable handles to caches and loaders.

use std::{collections::HashMap, fmt::Debug, sync::Arc};

use bytes::Bytes;

use crate::{
    BackingLoader, CacheWrite, DistributedCache, Error, cache::DynDistributedCache, loader::DynBackingLoader,
};

/// Extension trait for converting any `DistributedCache` into a [`SharedCache`].
///
/// # Examples
///
/// ```
/// use cachepipe_tier::{DistributedCache, SharedCache, SharedCacheExt};
///
/// fn erase<T>(tier: T) -> SharedCache
/// where
///     T: DistributedCache + 'static,
/// {
///     tier.into_shared()
/// }
/// ```
pub trait SharedCacheExt: Sized {
    /// Converts this cache into a `SharedCache`.
    fn into_shared(self) -> SharedCache;
}

impl<T> SharedCacheExt for T
where
    T: DistributedCache + 'static,
{
    fn into_shared(self) -> SharedCache {
        SharedCache::new(self)
    }
}

/// A clonable distributed cache with type erasure.
///
/// Wraps a trait object in an `Arc` so that many sessions can share one cache
/// connection without knowing its concrete type.
pub struct SharedCache(Arc<DynDistributedCache<'static>>);

impl SharedCache {
    /// Creates a shared handle from any `DistributedCache` implementation.
    pub fn new<T>(cache: T) -> Self
    where
        T: DistributedCache + 'static,
    {
        Self(DynDistributedCache::new_arc(cache))
    }
}

impl Debug for SharedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedCache").finish()
    }
}

impl Clone for SharedCache {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl DistributedCache for SharedCache {
    async fn bulk_get(&self, keys: &[String]) -> Result<Vec<Option<Bytes>>, Error> {
        self.0.bulk_get(keys).await
    }

    async fn bulk_set(&self, entries: Vec<CacheWrite>) -> Result<(), Error> {
        self.0.bulk_set(entries).await
    }
}

/// A clonable backing loader with type erasure.
pub struct SharedLoader<K, V>(Arc<DynBackingLoader<'static, K, V>>);

impl<K, V> SharedLoader<K, V> {
    /// Creates a shared handle from any `BackingLoader` implementation.
    pub fn new<T>(loader: T) -> Self
    where
        T: BackingLoader<K, V> + 'static,
    {
        Self(DynBackingLoader::new_arc(loader))
    }
}

impl<K, V> Debug for SharedLoader<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedLoader").finish()
    }
}

impl<K, V> Clone for SharedLoader<K, V> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<K, V> BackingLoader<K, V> for SharedLoader<K, V>
where
    K: Sync,
    V: Send,
{
    async fn load(&self, keys: &[K]) -> Result<HashMap<K, V>, Error> {
        self.0.load(keys).await
    }
}
