// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Contracts shared by the cachepipe crates.
//!
//! This crate defines the narrow interfaces a batch-coalescing read-through
//! cache needs from the outside world:
//!
//! - [`DistributedCache`]: bulk get/set of opaque payloads against a shared tier
//! - [`BackingLoader`]: batched key-set to value-set fetch from the authoritative store
//! - [`Codec`]: conversion between domain values and payload bytes
//! - [`Error`]: the error taxonomy every lookup reports through
//!
//! # Implementing a Cache Tier
//!
//! ```
//! use std::collections::HashMap;
//! use std::sync::RwLock;
//!
//! use bytes::Bytes;
//! use cachepipe_tier::{CacheWrite, DistributedCache, Error};
//!
//! struct SimpleCache(RwLock<HashMap<String, Bytes>>);
//!
//! impl DistributedCache for SimpleCache {
//!     async fn bulk_get(&self, keys: &[String]) -> Result<Vec<Option<Bytes>>, Error> {
//!         let data = self.0.read().unwrap();
//!         Ok(keys.iter().map(|k| data.get(k).cloned()).collect())
//!     }
//!
//!     async fn bulk_set(&self, entries: Vec<CacheWrite>) -> Result<(), Error> {
//!         let mut data = self.0.write().unwrap();
//!         for entry in entries {
//!             data.insert(entry.key, entry.value);
//!         }
//!         Ok(())
//!     }
//! }
//! ```
//!
//! # Dynamic Dispatch
//!
//! [`SharedCache`] and [`SharedLoader`] wrap any implementation in a clonable,
//! type-erased handle so sessions can share them without naming concrete types.

mod cache;
mod codec;
mod dynamic;
pub mod error;
mod loader;
#[cfg(any(feature = "test-util", test))]
pub mod testing;

#[doc(inline)]
pub use cache::{CacheWrite, DistributedCache};
#[doc(inline)]
pub use codec::{Codec, DecodeError};
#[doc(inline)]
pub use dynamic::{SharedCache, SharedCacheExt, SharedLoader};
#[doc(inline)]
pub use error::{Error, ErrorKind, Result};
#[doc(inline)]
pub use loader::BackingLoader;
