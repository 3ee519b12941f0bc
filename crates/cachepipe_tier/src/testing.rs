// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mock cache and loader implementations for testing.
//!
//! [`MockCache`] and [`MockLoader`] keep their data in memory, record every call
//! and support failure injection for testing error paths.

use std::{collections::HashMap, hash::Hash, sync::Arc, time::Duration};

use bytes::Bytes;
use parking_lot::Mutex;

use crate::{BackingLoader, CacheWrite, DistributedCache, Error};

/// Recorded cache operation with full context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOp {
    /// A bulk read of the given keys.
    BulkGet(Vec<String>),
    /// A bulk write of the given entries.
    BulkSet(Vec<CacheWrite>),
}

type FailPredicate = Box<dyn Fn(&CacheOp) -> bool + Send + Sync>;

#[derive(Debug, Clone)]
struct Stored {
    value: Bytes,
    ttl: Option<Duration>,
}

/// A configurable mock distributed cache.
///
/// Values never expire; the TTL of each write is kept so tests can inspect it.
///
/// # Examples
///
/// ```no_run
/// use bytes::Bytes;
/// use cachepipe_tier::{CacheWrite, DistributedCache, testing::{CacheOp, MockCache}};
///
/// # async fn example() {
/// let cache = MockCache::new();
///
/// cache.bulk_set(vec![CacheWrite::new("a", Bytes::from_static(b"1"))]).await.unwrap();
/// let values = cache.bulk_get(&["a".to_string(), "b".to_string()]).await.unwrap();
/// assert_eq!(values, vec![Some(Bytes::from_static(b"1")), None]);
///
/// // Fail every read
/// cache.fail_when(|op| matches!(op, CacheOp::BulkGet(_)));
/// assert!(cache.bulk_get(&["a".to_string()]).await.is_err());
/// # }
/// ```
pub struct MockCache {
    data: Arc<Mutex<HashMap<String, Stored>>>,
    operations: Arc<Mutex<Vec<CacheOp>>>,
    fail_when: Arc<Mutex<Option<FailPredicate>>>,
}

impl std::fmt::Debug for MockCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockCache")
            .field("data", &self.data)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish()
    }
}

impl Clone for MockCache {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            operations: Arc::clone(&self.operations),
            fail_when: Arc::clone(&self.fail_when),
        }
    }
}

impl Default for MockCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCache {
    /// Creates a new empty mock cache.
    #[must_use]
    pub fn new() -> Self {
        Self::with_data(HashMap::new())
    }

    /// Creates a mock cache with pre-populated payloads.
    #[must_use]
    pub fn with_data(data: HashMap<String, Bytes>) -> Self {
        let data = data.into_iter().map(|(k, value)| (k, Stored { value, ttl: None })).collect();
        Self {
            data: Arc::new(Mutex::new(data)),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
        }
    }

    /// Stores a payload directly, without recording an operation.
    pub fn put(&self, key: impl Into<String>, value: impl Into<Bytes>) {
        self.data.lock().insert(
            key.into(),
            Stored {
                value: value.into(),
                ttl: None,
            },
        );
    }

    /// Returns the stored payload for `key`, without recording an operation.
    #[must_use]
    pub fn stored(&self, key: &str) -> Option<Bytes> {
        self.data.lock().get(key).map(|s| s.value.clone())
    }

    /// Returns the TTL the payload for `key` was written with.
    #[must_use]
    pub fn stored_ttl(&self, key: &str) -> Option<Duration> {
        self.data.lock().get(key).and_then(|s| s.ttl)
    }

    /// Returns the number of entries in the cache.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.data.lock().len()
    }

    /// Returns true if the cache contains the given key.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.lock().contains_key(key)
    }

    /// Sets a predicate that determines when operations should fail.
    ///
    /// # Examples
    ///
    /// ```
    /// use cachepipe_tier::testing::{CacheOp, MockCache};
    ///
    /// let cache = MockCache::new();
    ///
    /// // Fail all operations
    /// cache.fail_when(|_| true);
    ///
    /// // Fail only writes
    /// cache.fail_when(|op| matches!(op, CacheOp::BulkSet(_)));
    /// ```
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&CacheOp) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate, allowing all operations to succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<CacheOp> {
        self.operations.lock().clone()
    }

    /// Returns the key lists of all recorded bulk reads.
    #[must_use]
    pub fn reads(&self) -> Vec<Vec<String>> {
        self.operations
            .lock()
            .iter()
            .filter_map(|op| match op {
                CacheOp::BulkGet(keys) => Some(keys.clone()),
                CacheOp::BulkSet(_) => None,
            })
            .collect()
    }

    /// Returns the entry lists of all recorded bulk writes.
    #[must_use]
    pub fn writes(&self) -> Vec<Vec<CacheWrite>> {
        self.operations
            .lock()
            .iter()
            .filter_map(|op| match op {
                CacheOp::BulkSet(entries) => Some(entries.clone()),
                CacheOp::BulkGet(_) => None,
            })
            .collect()
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    fn record(&self, op: CacheOp) {
        self.operations.lock().push(op);
    }

    fn should_fail(&self, op: &CacheOp) -> bool {
        self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(op))
    }
}

impl DistributedCache for MockCache {
    async fn bulk_get(&self, keys: &[String]) -> Result<Vec<Option<Bytes>>, Error> {
        let op = CacheOp::BulkGet(keys.to_vec());
        let fail = self.should_fail(&op);
        self.record(op);
        if fail {
            return Err(Error::cache_unavailable("mock: bulk_get failed"));
        }
        let data = self.data.lock();
        Ok(keys.iter().map(|k| data.get(k).map(|s| s.value.clone())).collect())
    }

    async fn bulk_set(&self, entries: Vec<CacheWrite>) -> Result<(), Error> {
        let op = CacheOp::BulkSet(entries.clone());
        let fail = self.should_fail(&op);
        self.record(op);
        if fail {
            return Err(Error::cache_unavailable("mock: bulk_set failed"));
        }
        let mut data = self.data.lock();
        for entry in entries {
            data.insert(
                entry.key,
                Stored {
                    value: entry.value,
                    ttl: entry.ttl,
                },
            );
        }
        Ok(())
    }
}

type LoadPredicate<K> = Box<dyn Fn(&[K]) -> bool + Send + Sync>;

/// A configurable mock backing loader.
///
/// Every call to [`BackingLoader::load`] is recorded with the keys it received.
///
/// # Examples
///
/// ```no_run
/// use std::collections::HashMap;
/// use cachepipe_tier::{BackingLoader, testing::MockLoader};
///
/// # async fn example() {
/// let loader = MockLoader::with_data(HashMap::from([("a".to_string(), 1)]));
///
/// let values = loader.load(&["a".to_string(), "b".to_string()]).await.unwrap();
/// assert_eq!(values.len(), 1);
/// assert_eq!(loader.calls(), vec![vec!["a".to_string(), "b".to_string()]]);
/// # }
/// ```
pub struct MockLoader<K, V> {
    data: Arc<Mutex<HashMap<K, V>>>,
    calls: Arc<Mutex<Vec<Vec<K>>>>,
    fail_when: Arc<Mutex<Option<LoadPredicate<K>>>>,
}

impl<K, V> std::fmt::Debug for MockLoader<K, V>
where
    K: std::fmt::Debug,
    V: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockLoader")
            .field("data", &self.data)
            .field("calls", &self.calls)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish()
    }
}

impl<K, V> Clone for MockLoader<K, V> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            calls: Arc::clone(&self.calls),
            fail_when: Arc::clone(&self.fail_when),
        }
    }
}

impl<K, V> Default for MockLoader<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> MockLoader<K, V> {
    /// Creates a loader whose store is empty.
    #[must_use]
    pub fn new() -> Self {
        Self::with_data(HashMap::new())
    }

    /// Creates a loader backed by `data`.
    #[must_use]
    pub fn with_data(data: HashMap<K, V>) -> Self {
        Self {
            data: Arc::new(Mutex::new(data)),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
        }
    }

    /// Sets a predicate over the requested key set that makes `load` fail.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&[K]) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Returns the number of `load` calls made so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl<K, V> MockLoader<K, V>
where
    K: Eq + Hash,
{
    /// Adds or replaces a value in the store.
    pub fn insert(&self, key: K, value: V) {
        self.data.lock().insert(key, value);
    }
}

impl<K: Clone, V> MockLoader<K, V> {
    /// Returns the key sets of all recorded calls, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<Vec<K>> {
        self.calls.lock().clone()
    }
}

impl<K, V> BackingLoader<K, V> for MockLoader<K, V>
where
    K: Clone + Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    async fn load(&self, keys: &[K]) -> Result<HashMap<K, V>, Error> {
        self.calls.lock().push(keys.to_vec());
        if self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(keys)) {
            return Err(Error::backing_store("mock: load failed"));
        }
        let data = self.data.lock();
        Ok(keys
            .iter()
            .filter_map(|k| data.get(k).map(|v| (k.clone(), v.clone())))
            .collect())
    }
}
