// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use cachepipe::{CacheKey, Codec, DecodeError, PostcardCodec};
use serde::{Deserialize, Serialize};

use crate::CatalogError;

/// A catalog product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// The stock keeping unit, unique per product.
    pub sku: String,
    /// Display name.
    pub name: String,
    /// Text indexed for search.
    pub search_text: String,
    /// Descriptive field 1.
    pub field1: String,
    /// Descriptive field 2.
    pub field2: String,
    /// Descriptive field 3.
    pub field3: String,
    /// Descriptive field 4.
    pub field4: String,
    /// Descriptive field 5.
    pub field5: String,
    /// Descriptive field 6.
    pub field6: String,
    /// Descriptive field 7.
    pub field7: String,
    /// Descriptive field 8.
    pub field8: String,
    /// Descriptive field 9.
    pub field9: String,
}

impl Product {
    /// Returns the key this product is cached under.
    #[must_use]
    pub fn key(&self) -> ProductKey {
        ProductKey::new(self.sku.clone())
    }
}

/// Identifies a product by SKU.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductKey {
    /// The stock keeping unit.
    pub sku: String,
}

impl ProductKey {
    /// Creates a key for `sku`.
    pub fn new(sku: impl Into<String>) -> Self {
        Self { sku: sku.into() }
    }
}

impl CacheKey for ProductKey {
    fn cache_key(&self) -> String {
        self.sku.clone()
    }
}

impl std::fmt::Display for ProductKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.sku)
    }
}

/// A product as the store keeps it: the SKU and the encoded product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductContent {
    /// The product's SKU.
    pub sku: String,
    /// The encoded product.
    pub content_data: Vec<u8>,
}

impl ProductContent {
    /// Encodes `product` into a stored row.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Encode`] if the product cannot be encoded.
    pub fn from_product(product: &Product) -> Result<Self, CatalogError> {
        let content_data = PostcardCodec::new().encode(product).map_err(|source| CatalogError::Encode {
            sku: product.sku.clone(),
            source,
        })?;
        Ok(Self {
            sku: product.sku.clone(),
            content_data: content_data.to_vec(),
        })
    }

    /// Decodes the stored product.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the row holds no valid product.
    pub fn decode(&self) -> Result<Product, DecodeError> {
        PostcardCodec::new().decode(&self.content_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_rows_decode_to_the_same_product() {
        let product = Product {
            sku: "SKU00000001".to_string(),
            name: "blue kettle".to_string(),
            field9: "last".to_string(),
            ..Product::default()
        };

        let row = ProductContent::from_product(&product).expect("products encode");

        assert_eq!(row.sku, "SKU00000001");
        assert_eq!(row.decode().expect("row is valid"), product);
    }

    #[test]
    fn garbage_rows_fail_to_decode() {
        let row = ProductContent {
            sku: "SKU1".to_string(),
            content_data: vec![0xff, 0xff, 0xff],
        };

        row.decode().unwrap_err();
    }

    #[test]
    fn key_is_the_sku() {
        let key = ProductKey::new("SKU00000042");
        assert_eq!(key.cache_key(), "SKU00000042");
        assert_eq!(key.to_string(), "SKU00000042");
    }
}
