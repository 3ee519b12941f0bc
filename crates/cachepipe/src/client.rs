// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Entry point that hands out sessions over one shared cache tier.

use std::{sync::Arc, time::Duration};

use cachepipe_tier::{DistributedCache, SharedCache};
#[cfg(any(feature = "metrics", test))]
use opentelemetry::metrics::{Meter, MeterProvider};

use crate::{
    Session, SessionOptions,
    pipeline::{Interrupt, Pipeline},
    telemetry::PipelineTelemetry,
};

const DEFAULT_NAME: &str = "cachepipe";

/// Builder for a [`Client`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use cachepipe::{Client, InMemoryCache};
///
/// let client = Client::builder(InMemoryCache::new())
///     .name("products")
///     .default_ttl(Duration::from_secs(300))
///     .build();
/// assert_eq!(client.name(), "products");
/// ```
#[must_use]
pub struct ClientBuilder {
    name: &'static str,
    cache: SharedCache,
    default_ttl: Option<Duration>,
    logs: bool,
    #[cfg(any(feature = "metrics", test))]
    meter: Option<Meter>,
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("name", &self.name)
            .field("default_ttl", &self.default_ttl)
            .field("logs", &self.logs)
            .finish_non_exhaustive()
    }
}

impl ClientBuilder {
    fn new(cache: SharedCache) -> Self {
        Self {
            name: DEFAULT_NAME,
            cache,
            default_ttl: None,
            logs: true,
            #[cfg(any(feature = "metrics", test))]
            meter: None,
        }
    }

    /// Sets the name attached to every log record and metric. Defaults to `"cachepipe"`.
    pub fn name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Sets the TTL of written-back entries for items that do not set their own.
    ///
    /// Without a TTL, entries live as long as the cache tier keeps them.
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Enables or disables structured logs through `tracing`. Enabled by default.
    pub fn logs(mut self, enabled: bool) -> Self {
        self.logs = enabled;
        self
    }

    /// Records OpenTelemetry metrics through `provider`.
    #[cfg(any(feature = "metrics", test))]
    pub fn metrics(mut self, provider: &dyn MeterProvider) -> Self {
        self.meter = Some(crate::telemetry::metrics::create_meter(provider));
        self
    }

    /// Builds the client.
    pub fn build(self) -> Client {
        #[cfg(any(feature = "metrics", test))]
        let telemetry = match &self.meter {
            Some(meter) => PipelineTelemetry::with_meter(self.logs, meter),
            None => PipelineTelemetry::new(self.logs),
        };
        #[cfg(not(any(feature = "metrics", test)))]
        let telemetry = PipelineTelemetry::new(self.logs);

        Client {
            inner: Arc::new(ClientInner {
                name: self.name,
                cache: self.cache,
                default_ttl: self.default_ttl,
                telemetry,
            }),
        }
    }
}

#[derive(Debug)]
struct ClientInner {
    name: &'static str,
    cache: SharedCache,
    default_ttl: Option<Duration>,
    telemetry: PipelineTelemetry,
}

/// Hands out [`Session`]s that batch lookups against one cache tier.
///
/// A client is cheap to clone and meant to be shared; sessions created from it
/// share the cache connection, configuration and telemetry, but never each
/// other's batches.
#[derive(Debug, Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Starts building a client over `cache`.
    pub fn builder(cache: impl DistributedCache + 'static) -> ClientBuilder {
        ClientBuilder::new(SharedCache::new(cache))
    }

    /// Returns the name used in logs and metrics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Starts a session with no deadline and no cancel signal.
    #[must_use]
    pub fn session(&self) -> Session {
        self.session_with(SessionOptions::default())
    }

    /// Starts a session with the given options.
    ///
    /// A timeout counts from this call.
    #[must_use]
    pub fn session_with(&self, options: SessionOptions) -> Session {
        let pipeline = Pipeline::new(
            self.inner.name,
            self.inner.cache.clone(),
            self.inner.default_ttl,
            self.inner.telemetry.clone(),
            Interrupt::new(options.signal, options.timeout),
        );
        Session::new(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use cachepipe_tier::testing::MockCache;

    use super::*;

    #[test]
    fn sessions_get_independent_pipelines() {
        let client = Client::builder(MockCache::new()).name("catalog").build();

        let first = client.session();
        let second = client.session();
        drop(first);

        assert_eq!(second.pipeline().name(), "catalog");
        assert!(!second.pipeline().is_closed());
    }

    #[test]
    fn builder_defaults() {
        let builder = Client::builder(MockCache::new());

        assert_eq!(builder.name, DEFAULT_NAME);
        assert!(builder.logs);
        assert!(builder.default_ttl.is_none());
    }

    #[test]
    fn default_ttl_reaches_pipelines() {
        let client = Client::builder(MockCache::new())
            .default_ttl(Duration::from_secs(30))
            .logs(false)
            .build();

        assert_eq!(client.session().pipeline().default_ttl(), Some(Duration::from_secs(30)));
    }

    #[cfg(feature = "serialize")]
    #[test]
    fn metrics_count_hits_misses_and_fills() {
        use std::collections::HashMap;

        use cachepipe_tier::testing::MockLoader;

        use crate::{Item, PostcardCodec, encode_value, telemetry::testing::MetricTester};

        let tester = MetricTester::new();
        let cache = MockCache::new();
        cache.put("hit", encode_value(&PostcardCodec::<u32>::new(), &1).expect("u32 encodes"));
        let store = MockLoader::with_data(HashMap::from([("miss".to_string(), 2_u32)]));
        let client = Client::builder(cache)
            .logs(false)
            .metrics(tester.meter_provider())
            .build();
        let session = client.session();
        let item = Item::builder(&session.pipeline(), PostcardCodec::new(), store).build();

        futures::executor::block_on(async {
            let hit = item.get("hit".to_string());
            let miss = item.get("miss".to_string());
            assert_eq!(hit.await.expect("cached"), 1);
            assert_eq!(miss.await.expect("loaded"), 2);
            session.finish().await;
        });

        assert_eq!(tester.event_total("cache.hit"), 1);
        assert_eq!(tester.event_total("cache.miss"), 1);
        assert_eq!(tester.event_total("loader.filled"), 1);
        assert_eq!(tester.event_total("cache.populated"), 1);
    }
}
