// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for `InMemoryCache`.

use std::time::Duration;

use bytes::Bytes;
use cachepipe_memory::{InMemoryCache, InMemoryCacheBuilder};
use cachepipe_tier::{CacheWrite, DistributedCache};

fn block_on<F: std::future::Future>(f: F) -> F::Output {
    futures::executor::block_on(f)
}

fn keys(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

#[test]
fn new_creates_empty_cache() {
    let cache = InMemoryCache::new();
    assert_eq!(cache.entry_count(), 0);
}

#[test]
fn bulk_get_returns_none_for_missing_keys() {
    block_on(async {
        let cache = InMemoryCache::new();
        let values = cache.bulk_get(&keys(&["a", "b"])).await.expect("bulk_get failed");
        assert_eq!(values, vec![None, None]);
    });
}

#[test]
fn bulk_set_then_bulk_get_preserves_positions() {
    block_on(async {
        let cache = InMemoryCache::with_capacity(100);
        cache
            .bulk_set(vec![
                CacheWrite::new("a", Bytes::from_static(b"1")),
                CacheWrite::new("c", Bytes::from_static(b"3")),
            ])
            .await
            .expect("bulk_set failed");

        let values = cache.bulk_get(&keys(&["a", "b", "c"])).await.expect("bulk_get failed");
        assert_eq!(
            values,
            vec![Some(Bytes::from_static(b"1")), None, Some(Bytes::from_static(b"3"))]
        );
    });
}

#[test]
fn bulk_set_overwrites_existing_value() {
    block_on(async {
        let cache = InMemoryCache::new();
        cache
            .bulk_set(vec![CacheWrite::new("a", Bytes::from_static(b"old"))])
            .await
            .expect("bulk_set failed");
        cache
            .bulk_set(vec![CacheWrite::new("a", Bytes::from_static(b"new"))])
            .await
            .expect("bulk_set failed");

        let values = cache.bulk_get(&keys(&["a"])).await.expect("bulk_get failed");
        assert_eq!(values, vec![Some(Bytes::from_static(b"new"))]);
    });
}

#[test]
fn per_write_ttl_expires_entry() {
    block_on(async {
        let cache = InMemoryCacheBuilder::new().time_to_live(Duration::from_secs(3600)).build();
        cache
            .bulk_set(vec![
                CacheWrite::new("short", Bytes::from_static(b"s")).with_ttl(Some(Duration::from_millis(20))),
                CacheWrite::new("long", Bytes::from_static(b"l")),
            ])
            .await
            .expect("bulk_set failed");

        std::thread::sleep(Duration::from_millis(60));

        let values = cache.bulk_get(&keys(&["short", "long"])).await.expect("bulk_get failed");
        assert_eq!(values, vec![None, Some(Bytes::from_static(b"l"))]);
    });
}

#[test]
fn invalidate_removes_entry() {
    block_on(async {
        let cache = InMemoryCache::builder().name("invalidate-test").build();
        cache
            .bulk_set(vec![CacheWrite::new("a", Bytes::from_static(b"1"))])
            .await
            .expect("bulk_set failed");

        cache.invalidate("a").await;

        let values = cache.bulk_get(&keys(&["a"])).await.expect("bulk_get failed");
        assert_eq!(values, vec![None]);
    });
}

#[test]
fn entry_count_reflects_inserts() {
    block_on(async {
        let cache = InMemoryCache::new();
        cache
            .bulk_set(vec![
                CacheWrite::new("a", Bytes::from_static(b"1")),
                CacheWrite::new("b", Bytes::from_static(b"2")),
            ])
            .await
            .expect("bulk_set failed");

        cache.run_pending_tasks().await;
        assert_eq!(cache.entry_count(), 2);
    });
}

#[test]
fn clones_share_storage() {
    block_on(async {
        let cache = InMemoryCache::new();
        let clone = cache.clone();
        clone
            .bulk_set(vec![CacheWrite::new("a", Bytes::from_static(b"1"))])
            .await
            .expect("bulk_set failed");

        let values = cache.bulk_get(&keys(&["a"])).await.expect("bulk_get failed");
        assert_eq!(values, vec![Some(Bytes::from_static(b"1"))]);
    });
}
