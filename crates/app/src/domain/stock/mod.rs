//! Stock
//!
//! Available quantity per product, with atomic multi-product reservation.

pub mod data;
pub mod errors;
mod ledger;

pub use errors::StockError;
pub use ledger::StockLedger;
