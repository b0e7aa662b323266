//! Orders

pub mod data;
pub mod errors;
pub mod lifecycle;
pub mod records;
pub mod repository;
pub mod service;

pub use errors::{OrderLifecycleError, OrdersServiceError};
pub use lifecycle::*;
pub use service::*;
