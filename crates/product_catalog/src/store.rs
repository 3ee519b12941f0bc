// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use parking_lot::Mutex;

use crate::{CatalogError, ProductContent};

/// The authoritative source of product rows.
pub trait ProductStore: Send + Sync + 'static {
    /// Returns the rows for `skus`. Unknown SKUs are omitted.
    fn get_products(&self, skus: &[String]) -> impl Future<Output = Result<Vec<ProductContent>, CatalogError>> + Send;

    /// Inserts or replaces `rows`.
    fn insert_products(&self, rows: Vec<ProductContent>) -> impl Future<Output = Result<(), CatalogError>> + Send;
}

/// A [`ProductStore`] kept in memory.
///
/// Counts every `get_products` call and can be switched offline to exercise
/// failure paths. Clones share the same rows and counters.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductStore {
    rows: Arc<Mutex<HashMap<String, ProductContent>>>,
    get_calls: Arc<AtomicUsize>,
    offline: Arc<AtomicBool>,
}

impl InMemoryProductStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many times `get_products` was called.
    #[must_use]
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::Relaxed)
    }

    /// Returns the number of stored rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    /// Returns `true` if no rows are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.lock().is_empty()
    }

    /// Makes every call fail with [`CatalogError::StoreUnavailable`] while `offline` is set.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    fn check_online(&self) -> Result<(), CatalogError> {
        if self.offline.load(Ordering::Relaxed) {
            return Err(CatalogError::store_unavailable("store is offline"));
        }
        Ok(())
    }
}

impl ProductStore for InMemoryProductStore {
    async fn get_products(&self, skus: &[String]) -> Result<Vec<ProductContent>, CatalogError> {
        self.get_calls.fetch_add(1, Ordering::Relaxed);
        self.check_online()?;
        let rows = self.rows.lock();
        Ok(skus.iter().filter_map(|sku| rows.get(sku).cloned()).collect())
    }

    async fn insert_products(&self, rows: Vec<ProductContent>) -> Result<(), CatalogError> {
        self.check_online()?;
        let mut stored = self.rows.lock();
        for row in rows {
            stored.insert(row.sku.clone(), row);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(sku: &str) -> ProductContent {
        ProductContent {
            sku: sku.to_string(),
            content_data: vec![1, 2, 3],
        }
    }

    #[test]
    fn unknown_skus_are_omitted() {
        futures::executor::block_on(async {
            let store = InMemoryProductStore::new();
            store.insert_products(vec![row("a"), row("b")]).await.expect("store is online");

            let rows = store
                .get_products(&["a".to_string(), "x".to_string()])
                .await
                .expect("store is online");

            assert_eq!(rows, vec![row("a")]);
            assert_eq!(store.get_calls(), 1);
            assert_eq!(store.len(), 2);
        });
    }

    #[test]
    fn offline_store_fails_and_still_counts_calls() {
        futures::executor::block_on(async {
            let store = InMemoryProductStore::new();
            store.set_offline(true);

            let error = store.get_products(&["a".to_string()]).await.unwrap_err();

            assert!(matches!(error, CatalogError::StoreUnavailable { .. }));
            assert_eq!(store.get_calls(), 1);
        });
    }
}
