// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Per-type lookups with deduplication, fill-through and write-back.

use std::{
    collections::HashMap,
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};

use bytes::Bytes;
use cachepipe_tier::{BackingLoader, CacheWrite, Codec, DistributedCache, Error, SharedLoader};
use futures::future::BoxFuture;
use parking_lot::Mutex;

use crate::{
    CacheKey, Lookup, Pipeline,
    payload::{self, Payload},
    pipeline::{AbortCause, Participant, PendingBatch},
    slot::LookupSlot,
    state::FetchState,
    telemetry::{Activity, Event, Operation},
};

/// Configuration of an [`Item`].
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ItemOptions {
    /// Name used in logs and metrics. Defaults to `"item"`.
    pub name: &'static str,
    /// Prefix prepended to every storage key.
    pub key_prefix: Option<String>,
    /// TTL of written-back values. Falls back to the client's default TTL.
    pub ttl: Option<Duration>,
    /// TTL of absent markers. `None` disables negative caching.
    pub negative_ttl: Option<Duration>,
}

impl Default for ItemOptions {
    fn default() -> Self {
        Self {
            name: "item",
            key_prefix: None,
            ttl: None,
            negative_ttl: None,
        }
    }
}

/// Builder for an [`Item`].
#[must_use]
pub struct ItemBuilder<K, V> {
    pipeline: Pipeline,
    codec: Arc<dyn Codec<V>>,
    loader: SharedLoader<K, V>,
    options: ItemOptions,
}

impl<K, V> fmt::Debug for ItemBuilder<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemBuilder")
            .field("pipeline", &self.pipeline.name())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<K, V> ItemBuilder<K, V>
where
    K: CacheKey,
    V: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(
        pipeline: Pipeline,
        codec: impl Codec<V> + 'static,
        loader: impl BackingLoader<K, V> + 'static,
    ) -> Self {
        Self {
            pipeline,
            codec: Arc::new(codec),
            loader: SharedLoader::new(loader),
            options: ItemOptions::default(),
        }
    }

    /// Sets the name used in logs and metrics.
    pub fn name(mut self, name: &'static str) -> Self {
        self.options.name = name;
        self
    }

    /// Prepends `prefix` to every storage key, so several items can share one cache.
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options.key_prefix = Some(prefix.into());
        self
    }

    /// Sets the TTL of written-back values, overriding the client's default.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.options.ttl = Some(ttl);
        self
    }

    /// Enables negative caching.
    ///
    /// Keys the loader does not return are stored as absent markers living for
    /// `ttl`; reading one back resolves `NotFound` without calling the loader.
    pub fn negative_ttl(mut self, ttl: Duration) -> Self {
        self.options.negative_ttl = Some(ttl);
        self
    }

    /// Builds the item.
    pub fn build(self) -> Item<K, V> {
        Item {
            pipeline: self.pipeline,
            core: Arc::new(ItemCore {
                options: self.options,
                codec: self.codec,
                loader: self.loader,
                batch: Mutex::new(ItemBatch::default()),
            }),
        }
    }
}

/// Typed lookups of one kind of value through a [`Pipeline`].
///
/// Calls to [`Item::get`] only register keys. Repeated requests for the same
/// key before a flush share one result; the flush reads every key in one bulk
/// cache call, loads the misses with one loader call, and writes the loaded
/// values back.
///
/// Clones share the same pending batch.
///
/// # Examples
///
/// ```
/// use cachepipe::{Client, InMemoryCache, Item, MultiGetLoader, PostcardCodec};
/// # futures::executor::block_on(async {
///
/// let client = Client::builder(InMemoryCache::new()).build();
/// let session = client.session();
/// let pipeline = session.pipeline();
///
/// let loader = MultiGetLoader::new(
///     |ids: Vec<u32>| async move { Ok::<_, std::io::Error>(ids.into_iter().map(|id| (id, id * 10)).collect()) },
///     |row: &(u32, u32)| row.0,
/// );
/// let rows = Item::builder(&pipeline, PostcardCodec::new(), loader).name("rows").build();
///
/// let first = rows.get(1);
/// let second = rows.get(2);
/// assert_eq!(first.await.unwrap(), (1, 10));
/// assert_eq!(second.await.unwrap(), (2, 20));
///
/// session.finish().await;
/// # });
/// ```
pub struct Item<K, V> {
    pipeline: Pipeline,
    core: Arc<ItemCore<K, V>>,
}

impl<K, V> Clone for Item<K, V> {
    fn clone(&self) -> Self {
        Self {
            pipeline: self.pipeline.clone(),
            core: Arc::clone(&self.core),
        }
    }
}

impl<K, V> fmt::Debug for Item<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("options", &self.core.options)
            .field("pending_keys", &self.core.batch.lock().entries.len())
            .finish_non_exhaustive()
    }
}

impl<K, V> Item<K, V>
where
    K: CacheKey,
    V: Clone + Send + Sync + 'static,
{
    /// Starts building an item bound to `pipeline`.
    pub fn builder(
        pipeline: &Pipeline,
        codec: impl Codec<V> + 'static,
        loader: impl BackingLoader<K, V> + 'static,
    ) -> ItemBuilder<K, V> {
        ItemBuilder::new(pipeline.clone(), codec, loader)
    }

    /// Requests the value for `key`.
    ///
    /// No I/O happens here. The returned lookup resolves once its batch is
    /// flushed, by [`Pipeline::execute`] or by awaiting any lookup of the
    /// pipeline. After the session finished, the lookup is already failed with
    /// [`ErrorKind::SessionFinished`](cachepipe_tier::ErrorKind::SessionFinished).
    pub fn get(&self, key: K) -> Lookup<V> {
        if self.pipeline.is_closed() {
            return Lookup::failed(Error::session_finished());
        }

        let mut batch = self.core.batch.lock();
        if let Some(entry) = batch.entries.get_mut(&key) {
            entry.waiters += 1;
            return Lookup::pending(Arc::clone(&entry.slot), self.pipeline.clone());
        }

        if !batch.enlisted {
            let participant: Arc<dyn Participant> = Arc::<ItemCore<K, V>>::clone(&self.core);
            if let Err(error) = self.pipeline.enlist(participant) {
                return Lookup::failed(error);
            }
            batch.enlisted = true;
        }

        let entry = PendingEntry::new();
        let lookup = Lookup::pending(Arc::clone(&entry.slot), self.pipeline.clone());
        batch.entries.insert(key, entry);
        lookup
    }

    /// Returns the item's configuration.
    #[must_use]
    pub fn options(&self) -> &ItemOptions {
        &self.core.options
    }

    /// Returns the number of distinct keys waiting for the next flush.
    #[must_use]
    pub fn pending_keys(&self) -> usize {
        self.core.batch.lock().entries.len()
    }

    /// Returns the pipeline this item is bound to.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}

struct ItemCore<K, V> {
    options: ItemOptions,
    codec: Arc<dyn Codec<V>>,
    loader: SharedLoader<K, V>,
    batch: Mutex<ItemBatch<K, V>>,
}

impl<K: CacheKey, V> ItemCore<K, V> {
    fn storage_key(&self, key: &K) -> String {
        match &self.options.key_prefix {
            Some(prefix) => format!("{prefix}{}", key.cache_key()),
            None => key.cache_key(),
        }
    }
}

struct ItemBatch<K, V> {
    entries: HashMap<K, PendingEntry<V>>,
    enlisted: bool,
}

impl<K, V> Default for ItemBatch<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            enlisted: false,
        }
    }
}

/// One distinct key of a batch and everyone waiting on it.
struct PendingEntry<V> {
    state: FetchState,
    slot: Arc<LookupSlot<V>>,
    waiters: usize,
}

impl<V> PendingEntry<V> {
    fn new() -> Self {
        Self {
            state: FetchState::Idle,
            slot: Arc::new(LookupSlot::new()),
            waiters: 1,
        }
    }

    fn advance(&mut self, next: FetchState) {
        self.state.advance(next);
    }

    fn resolve(&mut self, result: Result<V, Error>) {
        self.state.advance(FetchState::Resolved);
        self.slot.resolve(result);
    }

    /// Hands `result` to the waiters while the entry still has bookkeeping to do.
    fn publish(&self, result: Result<V, Error>) {
        self.slot.resolve(result);
    }
}

impl<K, V> Participant for ItemCore<K, V>
where
    K: CacheKey,
    V: Clone + Send + Sync + 'static,
{
    fn take_batch(self: Arc<Self>, aborted: &AbortCause) -> Option<Box<dyn PendingBatch>> {
        let mut entries = std::mem::take(&mut *self.batch.lock()).entries;
        if entries.is_empty() {
            return None;
        }

        let requests: usize = entries.values().map(|entry| entry.waiters).sum();
        tracing::trace!(cachepipe.name = self.options.name, keys = entries.len(), requests, "batch taken");

        let mut keys = Vec::with_capacity(entries.len());
        let mut cache_keys = Vec::with_capacity(entries.len());
        for (key, entry) in &mut entries {
            entry.advance(FetchState::CacheReadIssued);
            cache_keys.push(self.storage_key(key));
            keys.push(key.clone());
        }

        Some(Box::new(TakenBatch {
            core: self,
            keys,
            cache_keys,
            entries,
            aborted: Arc::clone(aborted),
        }))
    }
}

/// An item's batch after a flush took it.
///
/// Dropping it resolves every key still unresolved with the flush's abort
/// cause, or a plain cancellation if the flush future itself was dropped.
struct TakenBatch<K, V> {
    core: Arc<ItemCore<K, V>>,
    keys: Vec<K>,
    cache_keys: Vec<String>,
    entries: HashMap<K, PendingEntry<V>>,
    aborted: AbortCause,
}

impl<K, V> Drop for TakenBatch<K, V> {
    fn drop(&mut self) {
        let error = self
            .aborted
            .get()
            .cloned()
            .unwrap_or_else(|| Error::cancelled().with_context("flush dropped before completion"));
        for entry in self.entries.values_mut() {
            if !entry.slot.is_resolved() {
                entry.resolve(Err(error.clone()));
            }
        }
    }
}

impl<K, V> PendingBatch for TakenBatch<K, V>
where
    K: CacheKey,
    V: Clone + Send + Sync + 'static,
{
    fn cache_keys(&self) -> &[String] {
        &self.cache_keys
    }

    fn complete(mut self: Box<Self>, reads: Option<Vec<Option<Bytes>>>, pipeline: Pipeline) -> BoxFuture<'static, ()> {
        Box::pin(async move { self.settle(reads, &pipeline).await })
    }

    fn fail(mut self: Box<Self>, error: &Error) {
        for entry in self.entries.values_mut() {
            if !entry.slot.is_resolved() {
                entry.resolve(Err(error.clone()));
            }
        }
    }
}

impl<K, V> TakenBatch<K, V>
where
    K: CacheKey,
    V: Clone + Send + Sync + 'static,
{
    fn entry(&mut self, key: &K) -> Option<&mut PendingEntry<V>> {
        self.entries.get_mut(key)
    }

    async fn settle(&mut self, reads: Option<Vec<Option<Bytes>>>, pipeline: &Pipeline) {
        let misses = self.apply_reads(reads, pipeline);
        if misses.is_empty() {
            return;
        }
        self.fill(misses, pipeline).await;
    }

    /// Resolves hits and returns the keys that must be loaded.
    fn apply_reads(&mut self, reads: Option<Vec<Option<Bytes>>>, pipeline: &Pipeline) -> Vec<K> {
        let core = Arc::clone(&self.core);
        let name = core.options.name;
        let reads = reads.unwrap_or_else(|| vec![None; self.keys.len()]);
        let keys = std::mem::take(&mut self.keys);

        let mut hits = 0;
        let mut misses = Vec::new();
        for (key, read) in keys.into_iter().zip(reads) {
            let Some(entry) = self.entry(&key) else {
                continue;
            };

            match read.map(|bytes| payload::decode(core.codec.as_ref(), &bytes)) {
                Some(Ok(Payload::Value(value))) => {
                    hits += 1;
                    entry.advance(FetchState::CacheHit);
                    entry.resolve(Ok(value));
                }
                Some(Ok(Payload::Absent)) => {
                    hits += 1;
                    entry.advance(FetchState::CacheHit);
                    entry.resolve(Err(Error::not_found(key.cache_key())));
                }
                Some(Err(decode_error)) => {
                    entry.advance(FetchState::CacheMiss);
                    let error = Error::from(decode_error).with_context(key.cache_key());
                    pipeline
                        .telemetry()
                        .record(&Event::new(name, Operation::BulkGet, Activity::DecodeFailed, 1).failed(&error));
                    misses.push(key);
                }
                None => {
                    entry.advance(FetchState::CacheMiss);
                    misses.push(key);
                }
            }
        }

        let telemetry = pipeline.telemetry();
        telemetry.record(&Event::new(name, Operation::BulkGet, Activity::Hit, hits));
        telemetry.record(&Event::new(name, Operation::BulkGet, Activity::Miss, misses.len()));
        misses
    }

    async fn fill(&mut self, misses: Vec<K>, pipeline: &Pipeline) {
        let core = Arc::clone(&self.core);
        let name = core.options.name;
        let telemetry = pipeline.telemetry();

        for key in &misses {
            if let Some(entry) = self.entry(key) {
                entry.advance(FetchState::FillRequested);
            }
        }

        let started = Instant::now();
        let mut loaded = match core.loader.load(&misses).await {
            Ok(loaded) => loaded,
            Err(error) => {
                let error = Error::backing_store(error);
                telemetry.record(
                    &Event::new(name, Operation::Load, Activity::FillFailed, misses.len())
                        .took(started.elapsed())
                        .failed(&error),
                );
                for key in &misses {
                    if let Some(entry) = self.entry(key) {
                        entry.advance(FetchState::FillFailed);
                        entry.resolve(Err(error.clone()));
                    }
                }
                return;
            }
        };
        let load_time = started.elapsed();

        let ttl = core.options.ttl.or_else(|| pipeline.default_ttl());
        let mut writes = Vec::new();
        let mut written = Vec::new();
        let mut outcomes = Vec::with_capacity(misses.len());
        let mut filled = 0;

        for key in misses {
            let storage_key = core.storage_key(&key);
            match loaded.remove(&key) {
                Some(value) => {
                    filled += 1;
                    match payload::encode_value(core.codec.as_ref(), &value) {
                        Ok(bytes) => {
                            writes.push(CacheWrite::new(storage_key, bytes).with_ttl(ttl));
                            written.push(key.clone());
                        }
                        Err(error) => telemetry.record(
                            &Event::new(name, Operation::BulkSet, Activity::PopulateFailed, 1).failed(&error),
                        ),
                    }
                    outcomes.push((key, Ok(value)));
                }
                None => {
                    if let Some(negative_ttl) = core.options.negative_ttl {
                        writes.push(CacheWrite::new(storage_key, payload::absent_marker()).with_ttl(Some(negative_ttl)));
                        written.push(key.clone());
                    }
                    let error = Error::not_found(key.cache_key());
                    outcomes.push((key, Err(error)));
                }
            }
        }

        let not_found = outcomes.len() - filled;
        telemetry.record(&Event::new(name, Operation::Load, Activity::Filled, filled).took(load_time));
        telemetry.record(&Event::new(name, Operation::Load, Activity::NotFound, not_found));

        // Waiters get their values before the write-back, which may be slow or cut short.
        let mut settled = Vec::with_capacity(outcomes.len());
        for (key, outcome) in outcomes {
            if let Some(entry) = self.entry(&key) {
                entry.advance(FetchState::FillSucceeded);
                entry.publish(outcome);
                settled.push(key);
            }
        }

        if !writes.is_empty() {
            self.write_back(writes, &written, pipeline).await;
        }

        for key in &settled {
            if let Some(entry) = self.entry(key) {
                entry.advance(FetchState::Resolved);
            }
        }
    }

    /// Writes loaded values back. Failures are logged and never reach the waiters.
    async fn write_back(&mut self, writes: Vec<CacheWrite>, written: &[K], pipeline: &Pipeline) {
        let name = self.core.options.name;
        let count = writes.len();
        let started = Instant::now();

        match pipeline.cache().bulk_set(writes).await {
            Ok(()) => {
                pipeline
                    .telemetry()
                    .record(&Event::new(name, Operation::BulkSet, Activity::Populated, count).took(started.elapsed()));
                for key in written {
                    if let Some(entry) = self.entry(key) {
                        entry.advance(FetchState::CachePopulated);
                    }
                }
            }
            Err(error) => pipeline.telemetry().record(
                &Event::new(name, Operation::BulkSet, Activity::PopulateFailed, count)
                    .took(started.elapsed())
                    .failed(&error),
            ),
        }
    }
}
