//! Stock Data

use smallvec::SmallVec;

use crate::domain::products::records::ProductUuid;

/// A quantity of one product to reserve or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLine {
    pub product_uuid: ProductUuid,
    pub quantity: u32,
}

impl StockLine {
    #[must_use]
    pub fn new(product_uuid: ProductUuid, quantity: u32) -> Self {
        Self {
            product_uuid,
            quantity,
        }
    }
}

/// Stock taken out of the ledger by a successful `reserve_many`.
///
/// Lines are merged per product and sorted by product uuid. Handing the lines
/// back to `release_many` restores exactly what was reserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    lines: SmallVec<[StockLine; 8]>,
}

impl Reservation {
    pub(crate) fn new(lines: SmallVec<[StockLine; 8]>) -> Self {
        Self { lines }
    }

    #[must_use]
    pub fn lines(&self) -> &[StockLine] {
        &self.lines
    }
}
