// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{fmt, sync::Arc};

use cachepipe_tier::Error;
use futures::future::BoxFuture;

use crate::{Pipeline, slot::LookupSlot};

/// The observable state of a [`Lookup`].
#[derive(Debug, Clone)]
pub enum LookupState<V> {
    /// The batch holding the key has not been flushed yet.
    Pending,
    /// The key resolved to a value.
    Resolved(V),
    /// The key resolved to an error.
    Failed(Error),
}

/// A deferred result returned by [`Item::get`](crate::Item::get).
///
/// Awaiting a lookup flushes its pipeline if the key is still outstanding, then
/// yields the shared outcome for the key. Lookups for the same key in the same
/// batch observe the same outcome. Clones share the result.
pub struct Lookup<V> {
    slot: Arc<LookupSlot<V>>,
    pipeline: Option<Pipeline>,
}

impl<V> Clone for Lookup<V> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
            pipeline: self.pipeline.clone(),
        }
    }
}

impl<V> fmt::Debug for Lookup<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lookup")
            .field("resolved", &self.slot.is_resolved())
            .finish_non_exhaustive()
    }
}

impl<V> Lookup<V> {
    pub(crate) fn pending(slot: Arc<LookupSlot<V>>, pipeline: Pipeline) -> Self {
        Self {
            slot,
            pipeline: Some(pipeline),
        }
    }

    pub(crate) fn failed(error: Error) -> Self {
        Self {
            slot: Arc::new(LookupSlot::resolved_with(Err(error))),
            pipeline: None,
        }
    }

    /// Returns `true` once the lookup has an outcome.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.slot.is_resolved()
    }
}

impl<V: Clone> Lookup<V> {
    /// Returns the current state without flushing anything.
    #[must_use]
    pub fn state(&self) -> LookupState<V> {
        match self.slot.get() {
            None => LookupState::Pending,
            Some(Ok(value)) => LookupState::Resolved(value),
            Some(Err(error)) => LookupState::Failed(error),
        }
    }
}

impl<V> IntoFuture for Lookup<V>
where
    V: Clone + Send + Sync + 'static,
{
    type Output = Result<V, Error>;
    type IntoFuture = BoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            if let Some(result) = self.slot.get() {
                return result;
            }
            if let Some(pipeline) = &self.pipeline {
                pipeline.execute().await;
            }
            // A concurrent flush may hold the batch; wait for it to resolve the key.
            self.slot.wait().await
        })
    }
}
