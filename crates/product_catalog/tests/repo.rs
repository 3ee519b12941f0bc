// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for product lookups through the cache.

use cachepipe::{Client, ErrorKind, InMemoryCache, MockCache};
use fastrand::Rng;
use product_catalog::{
    CatalogError, InMemoryProductStore, Product, ProductCacheFactory, ProductContent, ProductStore, Vocabulary,
};

type TestResult = Result<(), CatalogError>;

async fn seeded_store(count: usize) -> Result<(InMemoryProductStore, Vec<Product>), CatalogError> {
    let vocabulary = Vocabulary::default();
    let mut rng = Rng::with_seed(42);
    let products: Vec<Product> = (0..count).map(|i| vocabulary.random_product(&mut rng, i)).collect();
    let rows = products
        .iter()
        .map(ProductContent::from_product)
        .collect::<Result<Vec<_>, _>>()?;

    let store = InMemoryProductStore::new();
    store.insert_products(rows).await?;
    Ok((store, products))
}

fn client() -> Client {
    Client::builder(InMemoryCache::new()).logs(false).build()
}

#[tokio::test]
async fn repeated_skus_cost_one_store_call() -> TestResult {
    let (store, products) = seeded_store(10).await?;
    let factory = ProductCacheFactory::new(client(), store);

    let repo = factory.new_repo();
    let lookups: Vec<_> = [1, 3, 1, 5, 3]
        .iter()
        .map(|i| (*i, repo.get_product(format!("SKU{i:08}"))))
        .collect();

    for (i, lookup) in lookups {
        assert_eq!(lookup.await.expect("seeded product"), products[i]);
    }
    repo.finish().await;

    assert_eq!(factory.store().get_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn later_repos_are_served_from_the_cache() -> TestResult {
    let (store, products) = seeded_store(3).await?;
    let factory = ProductCacheFactory::new(client(), store);

    let first = factory.new_repo();
    assert_eq!(first.get_product("SKU00000002").await.expect("seeded"), products[2]);
    first.finish().await;

    let second = factory.new_repo();
    assert_eq!(second.get_product("SKU00000002").await.expect("cached"), products[2]);
    second.finish().await;

    assert_eq!(factory.store().get_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn unknown_sku_is_not_found() -> TestResult {
    let (store, _) = seeded_store(1).await?;
    let factory = ProductCacheFactory::new(client(), store);

    let repo = factory.new_repo();
    let error = repo.get_product("SKU99999999").await.unwrap_err();
    repo.finish().await;

    assert!(error.is_not_found());
    Ok(())
}

#[tokio::test]
async fn corrupt_rows_resolve_not_found_and_are_not_cached() -> TestResult {
    let (store, products) = seeded_store(2).await?;
    store
        .insert_products(vec![ProductContent {
            sku: "SKU00000001".to_string(),
            content_data: vec![0xff, 0xff, 0xff],
        }])
        .await?;
    let cache = MockCache::new();
    let factory = ProductCacheFactory::new(Client::builder(cache.clone()).logs(false).build(), store);

    let repo = factory.new_repo();
    let good = repo.get_product("SKU00000000");
    let corrupt = repo.get_product("SKU00000001");

    assert_eq!(good.await.expect("valid row"), products[0]);
    assert!(corrupt.await.unwrap_err().is_not_found());
    repo.finish().await;

    assert!(cache.contains_key("product:SKU00000000"));
    assert!(!cache.contains_key("product:SKU00000001"));
    Ok(())
}

#[tokio::test]
async fn store_outage_fails_only_uncached_products() -> TestResult {
    let (store, products) = seeded_store(2).await?;
    let factory = ProductCacheFactory::new(client(), store);

    let warm = factory.new_repo();
    warm.get_product("SKU00000000").await.expect("seeded");
    warm.finish().await;

    factory.store().set_offline(true);

    let repo = factory.new_repo();
    let cached = repo.get_product("SKU00000000");
    let uncached = repo.get_product("SKU00000001");

    assert_eq!(cached.await.expect("served from the cache"), products[0]);
    assert_eq!(uncached.await.unwrap_err().kind(), ErrorKind::BackingStore);
    repo.finish().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_repos_resolve_independently() -> TestResult {
    let (store, products) = seeded_store(20).await?;
    let factory = std::sync::Arc::new(ProductCacheFactory::new(client(), store));

    let tasks: Vec<_> = (0..4)
        .map(|worker| {
            let factory = std::sync::Arc::clone(&factory);
            tokio::spawn(async move {
                let repo = factory.new_repo();
                let lookups: Vec<_> = (0..5)
                    .map(|j| {
                        let i = worker * 5 + j;
                        (i, repo.get_product(format!("SKU{i:08}")))
                    })
                    .collect();
                let mut found = Vec::new();
                for (i, lookup) in lookups {
                    found.push((i, lookup.await.expect("seeded product")));
                }
                repo.finish().await;
                found
            })
        })
        .collect();

    for task in tasks {
        for (i, product) in task.await.expect("task completes") {
            assert_eq!(product, products[i]);
        }
    }
    assert_eq!(factory.store().get_calls(), 4);
    Ok(())
}
