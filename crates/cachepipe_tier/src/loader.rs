// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The contract for the authoritative store behind the cache.

use std::collections::HashMap;

use crate::Error;

/// Batched access to the authoritative store.
///
/// `load` receives a deduplicated key set in no particular order. Keys the store
/// does not know are simply left out of the returned map; callers report them as
/// not found. An `Err` fails every key of the call.
#[dynosaur::dynosaur(pub(crate) DynBackingLoader = dyn(box) BackingLoader, bridge(none))]
pub trait BackingLoader<K, V>: Send + Sync {
    /// Loads the values for `keys`.
    fn load(&self, keys: &[K]) -> impl Future<Output = Result<HashMap<K, V>, Error>> + Send;
}
