// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Errors raised by the product catalog.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CatalogError {
    /// The product store could not serve the request.
    #[error("product store unavailable: {reason}")]
    StoreUnavailable {
        /// Why the store is unavailable.
        reason: String,
    },

    /// A product could not be encoded into a stored row.
    #[error("failed to encode product {sku}")]
    Encode {
        /// The product's SKU.
        sku: String,
        /// The underlying codec error.
        #[source]
        source: cachepipe::Error,
    },

    /// A vocabulary needs at least one word.
    #[error("vocabulary has no words")]
    EmptyVocabulary,
}

impl CatalogError {
    /// Creates a [`CatalogError::StoreUnavailable`] error.
    pub fn store_unavailable(reason: impl Into<String>) -> Self {
        Self::StoreUnavailable { reason: reason.into() }
    }
}
