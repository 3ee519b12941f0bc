// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Batch accumulation and bulk execution.
//!
//! A [`Pipeline`] collects the keys requested through its items and turns them
//! into one bulk cache read per flush. Each item then completes its own share of
//! the batch (fill-through, write-back and resolution) concurrently with the
//! others.

use std::{
    fmt,
    pin::pin,
    sync::{Arc, OnceLock},
    time::{Duration, Instant},
};

use bytes::Bytes;
use cachepipe_tier::{BackingLoader, Codec, DistributedCache, Error, SharedCache};
use futures::future::{BoxFuture, Either, join_all, select};
use parking_lot::Mutex;

use crate::{
    CacheKey, CancelSignal,
    item::ItemBuilder,
    telemetry::{Activity, Event, Operation, PipelineTelemetry},
};

/// Why a flush stopped early. Set once, read by every batch the flush drops.
pub(crate) type AbortCause = Arc<OnceLock<Error>>;

/// An item that may hold keys waiting for the next flush.
pub(crate) trait Participant: Send + Sync {
    /// Takes the item's current batch, leaving an empty one behind.
    fn take_batch(self: Arc<Self>, aborted: &AbortCause) -> Option<Box<dyn PendingBatch>>;
}

/// One item's share of a flush.
pub(crate) trait PendingBatch: Send {
    /// Storage keys to read, one per distinct requested key.
    fn cache_keys(&self) -> &[String];

    /// Completes the batch given the cache read results, or `None` if the read failed.
    fn complete(self: Box<Self>, reads: Option<Vec<Option<Bytes>>>, pipeline: Pipeline) -> BoxFuture<'static, ()>;

    /// Resolves every unresolved key with `error`.
    fn fail(self: Box<Self>, error: &Error);
}

#[derive(Default)]
struct PipelineState {
    participants: Vec<Arc<dyn Participant>>,
    closed: bool,
}

/// What can cut a flush short.
#[derive(Debug, Clone, Default)]
pub(crate) struct Interrupt {
    signal: Option<CancelSignal>,
    deadline: Option<tokio::time::Instant>,
}

impl Interrupt {
    pub(crate) fn new(signal: Option<CancelSignal>, timeout: Option<Duration>) -> Self {
        Self {
            signal,
            deadline: timeout.map(|t| tokio::time::Instant::now() + t),
        }
    }

    fn check(&self) -> Option<Error> {
        if self.signal.as_ref().is_some_and(CancelSignal::is_cancelled) {
            return Some(Error::cancelled().with_context("cancel signal fired"));
        }
        if self.deadline.is_some_and(|d| d <= tokio::time::Instant::now()) {
            return Some(Error::cancelled().with_context("session deadline elapsed"));
        }
        None
    }

    async fn triggered(&self) -> Error {
        let fired = pin!(async {
            match &self.signal {
                Some(signal) => signal.cancelled().await,
                None => std::future::pending().await,
            }
            Error::cancelled().with_context("cancel signal fired")
        });
        let elapsed = pin!(async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
            Error::cancelled().with_context("session deadline elapsed")
        });
        select(fired, elapsed).await.factor_first().0
    }

    /// Runs `work` unless the signal fires or the deadline passes first.
    ///
    /// On interruption the error is stored in `aborted` before `work` is dropped.
    async fn guard<F: Future>(&self, work: F, aborted: &AbortCause) -> Result<F::Output, Error> {
        if self.signal.is_none() && self.deadline.is_none() {
            return Ok(work.await);
        }
        let mut work = pin!(work);
        match select(work.as_mut(), pin!(self.triggered())).await {
            Either::Left((output, _)) => Ok(output),
            Either::Right((error, _)) => {
                aborted.get_or_init(|| error.clone());
                Err(error)
            }
        }
    }
}

struct PipelineInner {
    name: &'static str,
    cache: SharedCache,
    default_ttl: Option<Duration>,
    telemetry: PipelineTelemetry,
    interrupt: Interrupt,
    state: Mutex<PipelineState>,
}

/// Accumulates lookups for one session and executes them in bulk.
///
/// A pipeline is obtained from [`Session::pipeline`](crate::Session::pipeline)
/// and is cheap to clone; clones share the same batch. Lookups are registered
/// through [`Item`](crate::Item)s bound to the pipeline and executed either
/// explicitly with [`Pipeline::execute`] or implicitly by awaiting any lookup.
#[derive(Clone)]
pub struct Pipeline {
    inner: Arc<PipelineInner>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Pipeline")
            .field("name", &self.inner.name)
            .field("pending_items", &state.participants.len())
            .field("closed", &state.closed)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub(crate) fn new(
        name: &'static str,
        cache: SharedCache,
        default_ttl: Option<Duration>,
        telemetry: PipelineTelemetry,
        interrupt: Interrupt,
    ) -> Self {
        Self {
            inner: Arc::new(PipelineInner {
                name,
                cache,
                default_ttl,
                telemetry,
                interrupt,
                state: Mutex::new(PipelineState::default()),
            }),
        }
    }

    /// Starts building an [`Item`](crate::Item) bound to this pipeline.
    ///
    /// Shorthand for [`Item::builder`](crate::Item::builder).
    pub fn item<K, V>(&self, codec: impl Codec<V> + 'static, loader: impl BackingLoader<K, V> + 'static) -> ItemBuilder<K, V>
    where
        K: CacheKey,
        V: Clone + Send + Sync + 'static,
    {
        ItemBuilder::new(self.clone(), codec, loader)
    }

    /// Returns the name used in logs and metrics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Returns `true` once the owning session finished or was dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    /// Flushes every outstanding lookup.
    ///
    /// Issues one bulk cache read for all distinct keys, one loader call per item
    /// for its misses and one best-effort bulk write per item for the filled
    /// keys. Returns once every key of the flushed batch is resolved. A pipeline
    /// with nothing outstanding makes no calls.
    pub async fn execute(&self) {
        let participants = std::mem::take(&mut self.inner.state.lock().participants);
        let aborted = AbortCause::default();
        let batches: Vec<Box<dyn PendingBatch>> = participants
            .into_iter()
            .filter_map(|p| p.take_batch(&aborted))
            .collect();
        if batches.is_empty() {
            return;
        }

        let key_count = batches.iter().map(|b| b.cache_keys().len()).sum();
        let started = Instant::now();

        if let Some(error) = self.inner.interrupt.check() {
            self.telemetry()
                .record(&Event::new(self.name(), Operation::Execute, Activity::Cancelled, key_count).failed(&error));
            for batch in batches {
                batch.fail(&error);
            }
            return;
        }

        // Dropping the batches on interruption resolves their remaining keys with the abort cause.
        match self.inner.interrupt.guard(self.run(batches), &aborted).await {
            Ok(()) => self
                .telemetry()
                .record(&Event::new(self.name(), Operation::Execute, Activity::Ok, key_count).took(started.elapsed())),
            Err(error) => self.telemetry().record(
                &Event::new(self.name(), Operation::Execute, Activity::Cancelled, key_count)
                    .took(started.elapsed())
                    .failed(&error),
            ),
        }
    }

    async fn run(&self, batches: Vec<Box<dyn PendingBatch>>) {
        let keys: Vec<String> = batches.iter().flat_map(|b| b.cache_keys().iter().cloned()).collect();
        self.telemetry().record_batch(self.name(), keys.len());

        let started = Instant::now();
        let reads = match self.inner.cache.bulk_get(&keys).await {
            Ok(values) if values.len() == keys.len() => {
                self.telemetry()
                    .record(&Event::new(self.name(), Operation::BulkGet, Activity::Ok, keys.len()).took(started.elapsed()));
                Some(values)
            }
            Ok(values) => {
                let error = Error::cache_unavailable(format!("expected {} values, got {}", keys.len(), values.len()));
                self.record_unavailable(keys.len(), started, &error);
                None
            }
            Err(error) => {
                self.record_unavailable(keys.len(), started, &error);
                None
            }
        };

        let mut reads = reads.map(Vec::into_iter);
        let completions: Vec<_> = batches
            .into_iter()
            .map(|batch| {
                let share = reads.as_mut().map(|r| r.by_ref().take(batch.cache_keys().len()).collect());
                batch.complete(share, self.clone())
            })
            .collect();
        join_all(completions).await;
    }

    fn record_unavailable(&self, keys: usize, started: Instant, error: &Error) {
        self.telemetry().record(
            &Event::new(self.name(), Operation::BulkGet, Activity::CacheUnavailable, keys)
                .took(started.elapsed())
                .failed(error),
        );
    }

    /// Registers an item for the next flush.
    pub(crate) fn enlist(&self, participant: Arc<dyn Participant>) -> Result<(), Error> {
        let mut state = self.inner.state.lock();
        if state.closed {
            return Err(Error::session_finished());
        }
        state.participants.push(participant);
        Ok(())
    }

    /// Rejects further lookups. Returns the number of items still holding keys.
    pub(crate) fn close(&self) -> usize {
        let mut state = self.inner.state.lock();
        state.closed = true;
        state.participants.len()
    }

    pub(crate) fn cache(&self) -> &SharedCache {
        &self.inner.cache
    }

    pub(crate) fn default_ttl(&self) -> Option<Duration> {
        self.inner.default_ttl
    }

    pub(crate) fn telemetry(&self) -> &PipelineTelemetry {
        &self.inner.telemetry
    }
}
