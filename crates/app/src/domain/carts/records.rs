//! Cart Records

use jiff::Timestamp;

use crate::{
    domain::{
        products::records::{ProductRecord, ProductUuid},
        users::UserUuid,
    },
    uuids::TypedUuid,
};

/// Cart Item UUID
pub type CartItemUuid = TypedUuid<CartItemRecord>;

/// Cart Item Record
///
/// At most one item exists per (user, product) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItemRecord {
    pub uuid: CartItemUuid,
    pub user_uuid: UserUuid,
    pub product_uuid: ProductUuid,
    pub quantity: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A cart item joined with the product it refers to.
///
/// `product` is a display snapshot and is `None` once the product has been
/// deleted from the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub item: CartItemRecord,
    pub product: Option<ProductRecord>,
}
