//! Storefront checkout domain: catalog, stock ledger, carts and orders.

pub mod context;
pub mod domain;
pub mod fixtures;
pub mod locks;
pub mod storage;
pub mod uuids;

#[cfg(test)]
mod test;
