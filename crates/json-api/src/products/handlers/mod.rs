//! Product Handlers

pub(crate) mod create;
pub(crate) mod delete;
pub(crate) mod get;
pub(crate) mod index;
pub(crate) mod update;

use std::str::FromStr;

use rust_decimal::Decimal;
use salvo::prelude::StatusError;

use crate::extensions::*;

/// Parse a decimal price sent as a string, e.g. `"12.50"`.
pub(super) fn parse_price(price: &str) -> Result<Decimal, StatusError> {
    Decimal::from_str(price.trim()).or_400("Price must be a decimal number")
}
