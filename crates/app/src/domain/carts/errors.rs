//! Carts service errors.

use thiserror::Error;

use crate::{
    domain::products::{ProductsServiceError, records::ProductUuid},
    storage::StorageError,
};

#[derive(Debug, Error)]
pub enum CartsServiceError {
    #[error("quantity must be at least one")]
    InvalidQuantity,

    /// `name` is the catalog name, when the product is still listed.
    #[error("insufficient stock for product {product}")]
    InsufficientStock {
        product: ProductUuid,
        name: Option<String>,
    },

    #[error("product {product} not found")]
    ProductNotFound { product: ProductUuid },

    #[error("cart item not found")]
    NotFound,

    #[error("storage error")]
    Storage(#[source] StorageError),
}

impl CartsServiceError {
    /// Convert a catalog lookup failure for `product`.
    pub(crate) fn from_catalog(product: ProductUuid, error: ProductsServiceError) -> Self {
        match error {
            ProductsServiceError::Storage(source) => Self::Storage(source),
            ProductsServiceError::NotFound
            | ProductsServiceError::AlreadyExists
            | ProductsServiceError::InvalidPrice
            | ProductsServiceError::InvalidName => Self::ProductNotFound { product },
        }
    }
}

impl From<StorageError> for CartsServiceError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::RowNotFound => Self::NotFound,
            StorageError::UniqueViolation | StorageError::Conflict | StorageError::Unavailable(_) => {
                Self::Storage(error)
            }
        }
    }
}
