//! Order Handlers

pub(crate) mod cancel;
pub(crate) mod create;
pub(crate) mod deliver;
pub(crate) mod get;
pub(crate) mod index;
pub(crate) mod items;
pub(crate) mod ship;
