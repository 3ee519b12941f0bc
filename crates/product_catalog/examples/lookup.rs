// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Product Lookup Example
//!
//! Seeds an in-memory product store, then runs concurrent sessions that each
//! request a handful of random SKUs (duplicates included). Every session costs
//! at most one store round trip, and later sessions mostly hit the cache.

use std::{sync::Arc, time::Duration};

use cachepipe::{Client, InMemoryCache};
use fastrand::Rng;
use product_catalog::{InMemoryProductStore, ProductCacheFactory, ProductContent, ProductStore, Vocabulary};

const PRODUCTS: usize = 1_000;
const SESSIONS: usize = 16;
const LOOKUPS_PER_SESSION: usize = 40;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    let vocabulary = Vocabulary::default();
    let mut rng = Rng::with_seed(2024);
    let rows = (0..PRODUCTS)
        .map(|i| ProductContent::from_product(&vocabulary.random_product(&mut rng, i)))
        .collect::<Result<Vec<_>, _>>()?;

    let store = InMemoryProductStore::new();
    store.insert_products(rows).await?;

    let cache = InMemoryCache::builder()
        .max_capacity(PRODUCTS as u64)
        .name("products")
        .build();
    let client = Client::builder(cache)
        .name("product_catalog")
        .default_ttl(Duration::from_secs(300))
        .logs(false)
        .build();
    let factory = Arc::new(ProductCacheFactory::new(client, store));

    let sessions: Vec<_> = (0..SESSIONS)
        .map(|session| {
            let factory = Arc::clone(&factory);
            tokio::spawn(async move {
                let mut rng = Rng::with_seed(session as u64);
                let repo = factory.new_repo();
                let lookups: Vec<_> = (0..LOOKUPS_PER_SESSION)
                    .map(|_| repo.get_product(format!("SKU{:08}", rng.usize(..PRODUCTS / 10))))
                    .collect();

                let mut found = 0;
                for lookup in lookups {
                    if lookup.await.is_ok() {
                        found += 1;
                    }
                }
                repo.finish().await;
                found
            })
        })
        .collect();

    let mut found = 0;
    for session in sessions {
        found += session.await?;
    }

    println!(
        "{found} of {} lookups found, {} store round trips for {SESSIONS} sessions",
        SESSIONS * LOOKUPS_PER_SESSION,
        factory.store().get_calls()
    );
    Ok(())
}
