// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! In-process distributed cache tier backed by moka.
//!
//! [`InMemoryCache`] implements [`DistributedCache`](cachepipe_tier::DistributedCache)
//! on top of moka's concurrent cache. Use [`InMemoryCacheBuilder`] to configure
//! capacity, a default TTL and a name without exposing moka types directly.
//!
//! # Quick Start
//!
//! ```
//! use bytes::Bytes;
//! use cachepipe_memory::InMemoryCacheBuilder;
//! use cachepipe_tier::{CacheWrite, DistributedCache};
//! use std::time::Duration;
//!
//! # futures::executor::block_on(async {
//! let cache = InMemoryCacheBuilder::new()
//!     .max_capacity(1000)
//!     .time_to_live(Duration::from_secs(300))
//!     .build();
//!
//! let write = CacheWrite::new("key", Bytes::from_static(b"v")).with_ttl(Some(Duration::from_secs(5)));
//! cache.bulk_set(vec![write]).await.unwrap();
//! let values = cache.bulk_get(&["key".to_string()]).await.unwrap();
//! assert_eq!(values[0].as_deref(), Some(&b"v"[..]));
//! # });
//! ```

pub mod builder;
pub mod tier;

#[doc(inline)]
pub use builder::InMemoryCacheBuilder;
#[doc(inline)]
pub use tier::InMemoryCache;
