//! Orders service errors.

use thiserror::Error;

use crate::{
    domain::{
        orders::records::OrderStatus, products::records::ProductUuid, stock::StockError,
    },
    storage::StorageError,
};

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("delivery address must not be blank")]
    InvalidAddress,

    #[error("insufficient stock for product {product}")]
    InsufficientStock { product: ProductUuid },

    #[error("product {product} not found")]
    ProductNotFound { product: ProductUuid },

    #[error("order not found")]
    NotFound,

    #[error("order belongs to another user")]
    NotOwner,

    #[error("storage error")]
    Storage(#[source] StorageError),
}

impl From<StorageError> for OrdersServiceError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::RowNotFound => Self::NotFound,
            StorageError::UniqueViolation | StorageError::Conflict | StorageError::Unavailable(_) => {
                Self::Storage(error)
            }
        }
    }
}

impl From<StockError> for OrdersServiceError {
    fn from(error: StockError) -> Self {
        match error {
            StockError::Insufficient { product, .. } | StockError::Overflow { product } => {
                Self::InsufficientStock { product }
            }
            StockError::UnknownProduct { product } => Self::ProductNotFound { product },
        }
    }
}

#[derive(Debug, Error)]
pub enum OrderLifecycleError {
    #[error("order not found")]
    NotFound,

    #[error("order belongs to another user")]
    NotOwner,

    #[error("order cannot leave status {current}")]
    InvalidStatusTransition { current: OrderStatus },

    #[error("stock ledger error")]
    Stock(#[source] StockError),

    #[error("storage error")]
    Storage(#[source] StorageError),
}

impl From<StorageError> for OrderLifecycleError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::RowNotFound => Self::NotFound,
            StorageError::UniqueViolation | StorageError::Conflict | StorageError::Unavailable(_) => {
                Self::Storage(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_errors_carry_the_offending_product() {
        let product = ProductUuid::new();

        let insufficient = OrdersServiceError::from(StockError::Insufficient {
            product,
            requested: 3,
            available: 1,
        });
        let unknown = OrdersServiceError::from(StockError::UnknownProduct { product });

        assert!(
            matches!(insufficient, OrdersServiceError::InsufficientStock { product: p } if p == product),
            "got {insufficient:?}"
        );
        assert!(
            matches!(unknown, OrdersServiceError::ProductNotFound { product: p } if p == product),
            "got {unknown:?}"
        );
    }
}
