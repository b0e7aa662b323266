//! Products Data

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::products::records::ProductUuid;

/// New Product Data
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewProduct {
    pub uuid: ProductUuid,
    pub name: String,
    pub price: Decimal,
    pub stock_quantity: u32,
}

/// Product Update Data
///
/// `stock_quantity` replaces the ledger level when present (restocking).
#[derive(Debug, Clone, PartialEq)]
pub struct ProductUpdate {
    pub price: Decimal,
    pub stock_quantity: Option<u32>,
}
