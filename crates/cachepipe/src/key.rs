// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::hash::Hash;

/// A key that can address a value in the distributed cache.
///
/// The returned string is the key's storage form; an item's optional prefix is
/// prepended to it before it reaches the cache tier.
pub trait CacheKey: Clone + Eq + Hash + Send + Sync + 'static {
    /// Returns the storage form of this key.
    fn cache_key(&self) -> String;
}

impl CacheKey for String {
    fn cache_key(&self) -> String {
        self.clone()
    }
}

macro_rules! impl_cache_key_for_integers {
    ($($t:ty),*) => {
        $(
            impl CacheKey for $t {
                fn cache_key(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

impl_cache_key_for_integers!(u32, u64, i32, i64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_key_is_used_verbatim() {
        assert_eq!("SKU00000001".to_string().cache_key(), "SKU00000001");
    }

    #[test]
    fn integer_keys_use_decimal_form() {
        assert_eq!(42_u64.cache_key(), "42");
        assert_eq!((-7_i64).cache_key(), "-7");
    }
}
