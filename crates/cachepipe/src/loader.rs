// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    hash::Hash,
};

use cachepipe_tier::{BackingLoader, Error};

/// Adapts a "fetch many values" function into a [`BackingLoader`].
///
/// `load_fn` receives the deduplicated missing keys and returns the values it
/// found, in any order. `key_fn` extracts the key of each returned value so
/// results can be matched back to the requested keys. Values for keys that were
/// not requested are ignored, and requested keys without a value resolve as not
/// found.
///
/// # Examples
///
/// ```
/// use cachepipe::MultiGetLoader;
/// use cachepipe_tier::BackingLoader;
///
/// #[derive(Clone)]
/// struct User { id: u64, name: String }
///
/// let loader = MultiGetLoader::new(
///     |ids: Vec<u64>| async move {
///         Ok::<_, std::io::Error>(ids.into_iter().filter(|id| *id < 10).map(|id| User { id, name: format!("user-{id}") }).collect())
///     },
///     |user: &User| user.id,
/// );
///
/// # futures::executor::block_on(async {
/// let users = loader.load(&[1, 42]).await.unwrap();
/// assert_eq!(users[&1].name, "user-1");
/// assert!(!users.contains_key(&42));
/// # });
/// ```
pub struct MultiGetLoader<F, KF> {
    load_fn: F,
    key_fn: KF,
}

impl<F, KF> MultiGetLoader<F, KF> {
    /// Creates a loader from a batch fetch function and a key extraction function.
    pub fn new(load_fn: F, key_fn: KF) -> Self {
        Self { load_fn, key_fn }
    }
}

impl<F, KF> fmt::Debug for MultiGetLoader<F, KF> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiGetLoader").finish_non_exhaustive()
    }
}

impl<K, V, F, Fut, E, KF> BackingLoader<K, V> for MultiGetLoader<F, KF>
where
    K: Clone + Eq + Hash + Send + Sync,
    V: Send,
    F: Fn(Vec<K>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<V>, E>> + Send,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
    KF: Fn(&V) -> K + Send + Sync,
{
    async fn load(&self, keys: &[K]) -> Result<HashMap<K, V>, Error> {
        let values = (self.load_fn)(keys.to_vec()).await.map_err(Error::backing_store)?;
        let requested: HashSet<&K> = keys.iter().collect();
        Ok(values
            .into_iter()
            .filter_map(|value| {
                let key = (self.key_fn)(&value);
                requested.contains(&key).then_some((key, value))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use cachepipe_tier::ErrorKind;

    use super::*;

    #[test]
    fn results_are_aligned_by_extracted_key() {
        let loader = MultiGetLoader::new(
            |keys: Vec<String>| async move {
                // Returned out of order, with one value nobody asked for.
                let mut values: Vec<(String, usize)> = keys.into_iter().map(|k| (k.clone(), k.len())).collect();
                values.reverse();
                values.push(("extra".to_string(), 0));
                Ok::<_, Error>(values)
            },
            |value: &(String, usize)| value.0.clone(),
        );

        let loaded = futures::executor::block_on(loader.load(&["a".to_string(), "bcd".to_string()]))
            .expect("load should succeed");

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded["a"].1, 1);
        assert_eq!(loaded["bcd"].1, 3);
    }

    #[test]
    fn load_fn_errors_become_backing_store_errors() {
        let calls = AtomicUsize::new(0);
        let loader = MultiGetLoader::new(
            |_keys: Vec<u64>| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<Vec<u64>, _>(std::io::Error::other("db down")) }
            },
            |value: &u64| *value,
        );

        let error = futures::executor::block_on(loader.load(&[1])).expect_err("load should fail");

        assert_eq!(error.kind(), ErrorKind::BackingStore);
        assert!(error.to_string().contains("db down"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
