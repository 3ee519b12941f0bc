// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! A pipelined, batch-coalescing read-through cache.
//!
//! Callers request values one key at a time and get back deferred
//! [`Lookup`]s. Nothing is fetched until a lookup is awaited or the
//! [`Pipeline`] is executed; at that point every outstanding key is read from
//! the cache tier in one bulk call, the misses of each [`Item`] are loaded
//! from the backing store in one call, and the loaded values are written back.
//! Requests for the same key within a batch share one outcome.
//!
//! - [`Client`] holds the cache tier and configuration and hands out sessions.
//! - [`Session`] scopes one [`Pipeline`] and flushes it on [`Session::finish`].
//! - [`Item`] binds a key type, a value type, a [`Codec`] and a
//!   [`BackingLoader`] to a pipeline.
//!
//! # Examples
//!
//! ```
//! use cachepipe::{Client, InMemoryCache, Item, MultiGetLoader, PostcardCodec};
//! # futures::executor::block_on(async {
//!
//! let client = Client::builder(InMemoryCache::new()).name("users").build();
//! let session = client.session();
//! let pipeline = session.pipeline();
//!
//! let loader = MultiGetLoader::new(
//!     |ids: Vec<String>| async move {
//!         Ok::<_, std::io::Error>(ids.into_iter().map(|id| (id.clone(), id.len())).collect())
//!     },
//!     |row: &(String, usize)| row.0.clone(),
//! );
//! let users = Item::builder(&pipeline, PostcardCodec::new(), loader).build();
//!
//! let a = users.get("alice".to_string());
//! let b = users.get("bob".to_string());
//! let again = users.get("alice".to_string());
//!
//! // One bulk read, one loader call for both keys.
//! assert_eq!(a.await?.1, 5);
//! assert_eq!(b.await?.1, 3);
//! assert_eq!(again.await?.1, 5);
//!
//! session.finish().await;
//! # Ok::<(), cachepipe::Error>(())
//! # });
//! ```
//!
//! # Features
//!
//! - `memory` (default): re-exports [`InMemoryCache`], a moka-backed cache tier.
//! - `serialize` (default): [`PostcardCodec`] for any `serde` value.
//! - `metrics`: OpenTelemetry metrics through [`ClientBuilder::metrics`].
//! - `test-util`: [`MockCache`] and [`MockLoader`] for tests.

mod cancel;
mod client;
#[cfg(feature = "serialize")]
mod codec;
mod item;
mod key;
mod loader;
mod lookup;
mod payload;
mod pipeline;
mod session;
mod slot;
mod state;
mod telemetry;

#[doc(inline)]
pub use cachepipe_tier::{
    BackingLoader, CacheWrite, Codec, DecodeError, DistributedCache, Error, ErrorKind, Result, SharedCache,
    SharedCacheExt, SharedLoader,
};
#[cfg(feature = "memory")]
#[doc(inline)]
pub use cachepipe_memory::InMemoryCache;
#[cfg(any(feature = "test-util", test))]
#[doc(inline)]
pub use cachepipe_tier::testing::{CacheOp, MockCache, MockLoader};
pub use cancel::{CancelSignal, Canceller};
pub use client::{Client, ClientBuilder};
#[cfg(feature = "serialize")]
pub use codec::PostcardCodec;
pub use item::{Item, ItemBuilder, ItemOptions};
pub use key::CacheKey;
pub use loader::MultiGetLoader;
pub use lookup::{Lookup, LookupState};
pub use payload::encode_value;
pub use pipeline::Pipeline;
pub use session::{Session, SessionOptions};
