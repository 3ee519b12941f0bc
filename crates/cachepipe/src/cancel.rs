// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use tokio::sync::watch;

/// The owning side of a cancellation signal.
///
/// Pass [`Canceller::signal`] into [`SessionOptions`](crate::SessionOptions) and
/// call [`Canceller::cancel`] to abort the session's outstanding work.
#[derive(Debug)]
pub struct Canceller {
    tx: watch::Sender<bool>,
}

impl Default for Canceller {
    fn default() -> Self {
        Self::new()
    }
}

impl Canceller {
    /// Creates a canceller that has not fired yet.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Returns a signal observing this canceller.
    #[must_use]
    pub fn signal(&self) -> CancelSignal {
        CancelSignal { rx: self.tx.subscribe() }
    }

    /// Fires the signal. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Returns `true` once [`Canceller::cancel`] was called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// The observing side of a cancellation signal.
///
/// A signal whose [`Canceller`] is dropped without firing never fires.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// Returns `true` if the signal has fired.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Completes when the signal fires.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        let sender_gone = rx.wait_for(|cancelled| *cancelled).await.is_err();
        if sender_gone {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn signal_observes_cancel() {
        let canceller = Canceller::new();
        let signal = canceller.signal();
        assert!(!signal.is_cancelled());

        canceller.cancel();
        canceller.cancel();

        assert!(signal.is_cancelled());
        assert!(canceller.is_cancelled());
        futures::executor::block_on(signal.cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_canceller_never_fires() {
        let signal = Canceller::new().signal();
        let fired = tokio::time::timeout(Duration::from_secs(1), signal.cancelled()).await;
        assert!(fired.is_err());
    }
}
