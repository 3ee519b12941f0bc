// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use crate::{CancelSignal, Pipeline};

/// Per-session settings passed to [`Client::session_with`](crate::Client::session_with).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use cachepipe::{Canceller, SessionOptions};
///
/// let canceller = Canceller::new();
/// let options = SessionOptions::new()
///     .timeout(Duration::from_millis(250))
///     .cancel_signal(canceller.signal());
/// ```
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct SessionOptions {
    pub(crate) timeout: Option<Duration>,
    pub(crate) signal: Option<CancelSignal>,
}

impl SessionOptions {
    /// Creates options with no deadline and no cancel signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails every lookup still unresolved once `timeout` has elapsed since the session started.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Fails every lookup still unresolved once `signal` fires.
    pub fn cancel_signal(mut self, signal: CancelSignal) -> Self {
        self.signal = Some(signal);
        self
    }
}

/// A unit of work owning one [`Pipeline`].
///
/// Finish a session with [`Session::finish`], which flushes whatever is still
/// outstanding. Dropping an unfinished session closes its pipeline and logs a
/// warning; lookups issued before the drop still resolve when awaited.
#[derive(Debug)]
pub struct Session {
    pipeline: Pipeline,
    finished: bool,
}

impl Session {
    pub(crate) fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            finished: false,
        }
    }

    /// Returns the session's pipeline. Every call returns a handle to the same pipeline.
    #[must_use]
    pub fn pipeline(&self) -> Pipeline {
        self.pipeline.clone()
    }

    /// Closes the pipeline and flushes every outstanding lookup.
    ///
    /// Lookups requested after this point fail with
    /// [`ErrorKind::SessionFinished`](cachepipe_tier::ErrorKind::SessionFinished).
    pub async fn finish(mut self) {
        self.pipeline.close();
        self.pipeline.execute().await;
        self.finished = true;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let outstanding = self.pipeline.close();
        if outstanding > 0 {
            tracing::warn!(
                cachepipe.name = self.pipeline.name(),
                outstanding_items = outstanding,
                "session dropped without finish; outstanding lookups resolve when awaited"
            );
        } else {
            tracing::warn!(cachepipe.name = self.pipeline.name(), "session dropped without finish");
        }
    }
}
