//! Cart Handlers

pub(crate) mod create;
pub(crate) mod delete;
pub(crate) mod index;
pub(crate) mod update;

use salvo::prelude::StatusError;

/// Quantities arrive signed so that zero and negative values can be
/// rejected with a useful message rather than a deserialisation error.
pub(super) fn parse_quantity(quantity: i64) -> Result<u32, StatusError> {
    u32::try_from(quantity)
        .ok()
        .filter(|quantity| *quantity > 0)
        .ok_or_else(|| StatusError::bad_request().brief("Quantity must be at least one"))
}
