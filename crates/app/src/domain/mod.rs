//! Storefront Domain Concerns

pub mod carts;
pub mod events;
pub mod orders;
pub mod products;
pub mod stock;
pub mod users;
