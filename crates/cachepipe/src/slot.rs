// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::pin::pin;

use cachepipe_tier::Error;
use parking_lot::Mutex;
use tokio::sync::Notify;

/// The shared result cell for every waiter on one key of one batch.
///
/// The first resolution wins; later attempts are ignored so all waiters observe
/// the same outcome.
#[derive(Debug)]
pub(crate) struct LookupSlot<V> {
    result: Mutex<Option<Result<V, Error>>>,
    resolved: Notify,
}

impl<V> LookupSlot<V> {
    pub(crate) fn new() -> Self {
        Self {
            result: Mutex::new(None),
            resolved: Notify::new(),
        }
    }

    pub(crate) fn resolved_with(result: Result<V, Error>) -> Self {
        Self {
            result: Mutex::new(Some(result)),
            resolved: Notify::new(),
        }
    }

    /// Stores `result` unless the slot already holds one. Returns whether it was stored.
    pub(crate) fn resolve(&self, result: Result<V, Error>) -> bool {
        {
            let mut slot = self.result.lock();
            if slot.is_some() {
                return false;
            }
            *slot = Some(result);
        }
        self.resolved.notify_waiters();
        true
    }

    pub(crate) fn is_resolved(&self) -> bool {
        self.result.lock().is_some()
    }
}

impl<V: Clone> LookupSlot<V> {
    pub(crate) fn get(&self) -> Option<Result<V, Error>> {
        self.result.lock().clone()
    }

    pub(crate) async fn wait(&self) -> Result<V, Error> {
        loop {
            let mut notified = pin!(self.resolved.notified());
            notified.as_mut().enable();
            if let Some(result) = self.get() {
                return result;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn first_resolution_wins() {
        let slot = LookupSlot::new();
        assert!(slot.resolve(Ok(1)));
        assert!(!slot.resolve(Ok(2)));
        assert_eq!(slot.get().map(Result::ok), Some(Some(1)));
    }

    #[tokio::test]
    async fn wait_returns_after_resolution_from_another_task() {
        let slot = Arc::new(LookupSlot::<i32>::new());
        let waiter = tokio::spawn({
            let slot = Arc::clone(&slot);
            async move { slot.wait().await }
        });

        tokio::task::yield_now().await;
        slot.resolve(Err(Error::cancelled()));

        let result = waiter.await.expect("waiter task panicked");
        assert!(result.expect_err("slot was resolved with an error").is_cancelled());
    }

    #[test]
    fn pre_resolved_slot_needs_no_waiting() {
        let slot = LookupSlot::resolved_with(Ok("ready"));
        assert!(slot.is_resolved());
        let value = futures::executor::block_on(slot.wait()).expect("slot holds a value");
        assert_eq!(value, "ready");
    }
}
