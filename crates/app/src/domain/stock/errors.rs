//! Stock ledger errors.

use thiserror::Error;

use crate::domain::products::records::ProductUuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockError {
    /// Fewer units are available than were requested.
    #[error("insufficient stock for product {product}: requested {requested}, available {available}")]
    Insufficient {
        product: ProductUuid,
        requested: u32,
        available: u32,
    },

    /// The product has no stock level registered.
    #[error("product {product} is not tracked by the stock ledger")]
    UnknownProduct { product: ProductUuid },

    /// Applying the change would overflow the counter.
    #[error("stock quantity for product {product} would overflow")]
    Overflow { product: ProductUuid },
}

impl StockError {
    /// The product the failure refers to.
    #[must_use]
    pub fn product(&self) -> ProductUuid {
        match self {
            Self::Insufficient { product, .. }
            | Self::UnknownProduct { product }
            | Self::Overflow { product } => *product,
        }
    }
}
