// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(docsrs, feature(doc_cfg))]

//! Product lookups served through a [`cachepipe`] read-through cache.
//!
//! A [`ProductCacheFactory`] pairs a cache [`Client`](cachepipe::Client) with a
//! [`ProductStore`]. Each [`ProductCacheRepo`] it creates owns one session:
//! products requested through it are read from the cache in one bulk call, and
//! the missing ones are fetched from the store in one call and cached.
//!
//! [`Vocabulary`] generates demo products for seeding a store.

mod error;
mod model;
mod repo;
mod store;
mod vocabulary;

pub use error::CatalogError;
pub use model::{Product, ProductContent, ProductKey};
pub use repo::{ProductCacheFactory, ProductCacheRepo};
pub use store::{InMemoryProductStore, ProductStore};
pub use vocabulary::Vocabulary;
