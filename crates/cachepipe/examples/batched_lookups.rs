// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Batched Lookups Example
//!
//! Requests several keys, some of them twice, then awaits them. One bulk cache
//! read and one loader call serve the whole batch; the second session only goes
//! back to the loader for the key it could not find.

use std::{
    sync::Arc,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use cachepipe::{Client, InMemoryCache, Item, MultiGetLoader, PostcardCodec, SharedLoader};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct User {
    id: u64,
    name: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let round_trips = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&round_trips);
    let loader: SharedLoader<u64, User> = SharedLoader::new(MultiGetLoader::new(
        move |ids: Vec<u64>| {
            counter.fetch_add(1, Ordering::Relaxed);
            async move {
                Ok::<_, std::io::Error>(
                    ids.into_iter()
                        .filter(|id| *id < 100)
                        .map(|id| User { id, name: format!("user-{id}") })
                        .collect::<Vec<_>>(),
                )
            }
        },
        |user: &User| user.id,
    ));

    let client = Client::builder(InMemoryCache::new())
        .name("users")
        .default_ttl(Duration::from_secs(60))
        .build();

    for round in 1..=2 {
        let session = client.session();
        let users = Item::builder(&session.pipeline(), PostcardCodec::new(), loader.clone())
            .name("users")
            .key_prefix("user:")
            .build();

        // Nothing is fetched yet.
        let lookups: Vec<_> = [1, 2, 3, 2, 1, 404].into_iter().map(|id| (id, users.get(id))).collect();

        for (id, lookup) in lookups {
            match lookup.await {
                Ok(user) => println!("round {round}: {id} -> {}", user.name),
                Err(error) if error.is_not_found() => println!("round {round}: {id} -> not found"),
                Err(error) => println!("round {round}: {id} -> {error}"),
            }
        }

        session.finish().await;
    }

    println!("loader round trips: {}", round_trips.load(Ordering::Relaxed));
}

