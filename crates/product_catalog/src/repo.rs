// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{fmt, sync::Arc};

use cachepipe::{Client, Item, Lookup, MultiGetLoader, Pipeline, PostcardCodec, Session};

use crate::{CatalogError, Product, ProductKey, ProductStore};

const KEY_PREFIX: &str = "product:";

/// Creates [`ProductCacheRepo`]s that read products through the cache.
///
/// # Examples
///
/// ```
/// use cachepipe::{Client, InMemoryCache};
/// use product_catalog::{InMemoryProductStore, ProductCacheFactory, ProductContent, ProductStore, Vocabulary};
/// # futures::executor::block_on(async {
///
/// let store = InMemoryProductStore::new();
/// let product = Vocabulary::default().random_product(&mut fastrand::Rng::with_seed(1), 1);
/// store.insert_products(vec![ProductContent::from_product(&product)?]).await?;
///
/// let factory = ProductCacheFactory::new(Client::builder(InMemoryCache::new()).build(), store);
/// let repo = factory.new_repo();
/// let found = repo.get_product("SKU00000001");
/// assert_eq!(found.await.unwrap(), product);
/// repo.finish().await;
/// # Ok::<(), product_catalog::CatalogError>(())
/// # });
/// ```
pub struct ProductCacheFactory<S> {
    client: Client,
    store: Arc<S>,
}

impl<S> fmt::Debug for ProductCacheFactory<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProductCacheFactory")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl<S: ProductStore> ProductCacheFactory<S> {
    /// Creates a factory reading through `client`'s cache and filling from `store`.
    #[must_use]
    pub fn new(client: Client, store: S) -> Self {
        Self {
            client,
            store: Arc::new(store),
        }
    }

    /// Returns the backing store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Starts a new session with its own batch of product lookups.
    #[must_use]
    pub fn new_repo(&self) -> ProductCacheRepo {
        let session = self.client.session();
        let store = Arc::clone(&self.store);
        let loader = MultiGetLoader::new(
            move |keys: Vec<ProductKey>| {
                let store = Arc::clone(&store);
                async move { load_products(store.as_ref(), keys).await }
            },
            Product::key,
        );
        let products = Item::builder(&session.pipeline(), PostcardCodec::new(), loader)
            .name("products")
            .key_prefix(KEY_PREFIX)
            .build();

        ProductCacheRepo { session, products }
    }
}

/// Fetches and decodes the rows for `keys`. Rows that fail to decode are skipped.
async fn load_products<S: ProductStore>(store: &S, keys: Vec<ProductKey>) -> Result<Vec<Product>, CatalogError> {
    let skus: Vec<String> = keys.into_iter().map(|key| key.sku).collect();
    let rows = store.get_products(&skus).await?;

    Ok(rows
        .into_iter()
        .filter_map(|row| match row.decode() {
            Ok(product) => Some(product),
            Err(error) => {
                tracing::warn!(sku = %row.sku, %error, "skipping undecodable product row");
                None
            }
        })
        .collect())
}

/// Product lookups for one session.
///
/// [`ProductCacheRepo::get_product`] only registers the SKU; awaiting any of
/// the returned lookups fetches every registered SKU at once.
#[derive(Debug)]
pub struct ProductCacheRepo {
    session: Session,
    products: Item<ProductKey, Product>,
}

impl ProductCacheRepo {
    /// Requests the product with `sku`.
    pub fn get_product(&self, sku: impl Into<String>) -> Lookup<Product> {
        self.products.get(ProductKey::new(sku))
    }

    /// Returns the pipeline batching this repo's lookups.
    #[must_use]
    pub fn pipeline(&self) -> Pipeline {
        self.session.pipeline()
    }

    /// Flushes outstanding lookups and ends the session.
    pub async fn finish(self) {
        self.session.finish().await;
    }
}
