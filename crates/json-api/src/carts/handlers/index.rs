//! Cart Index Handler

use std::sync::Arc;

use rust_decimal::Decimal;
use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::carts::records::CartLine;

use crate::{carts::errors::into_status_error, extensions::*, state::State};

/// Cart Item Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartItemResponse {
    /// Cart item UUID
    pub uuid: Uuid,

    /// Product UUID
    pub product_uuid: Uuid,

    /// Units requested
    pub quantity: u32,

    /// Product name; absent once the product has been deleted
    pub name: Option<String>,

    /// Current unit price; absent once the product has been deleted
    pub price: Option<String>,

    /// Units currently in stock; absent once the product has been deleted
    pub stock_quantity: Option<u32>,
}

impl From<CartLine> for CartItemResponse {
    fn from(line: CartLine) -> Self {
        CartItemResponse {
            uuid: line.item.uuid.into(),
            product_uuid: line.item.product_uuid.into(),
            quantity: line.item.quantity,
            name: line.product.as_ref().map(|p| p.name.clone()),
            price: line.product.as_ref().map(|p| p.price.to_string()),
            stock_quantity: line.product.as_ref().map(|p| p.stock_quantity),
        }
    }
}

/// Cart Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartResponse {
    /// Items in the order they were added
    pub items: Vec<CartItemResponse>,

    /// Sum of current prices for items whose product still exists
    pub subtotal: String,
}

/// Cart Index Handler
///
/// Returns the current user's cart. Prices shown are informational; the
/// order snapshots prices again at checkout.
#[endpoint(
    tags("cart"),
    summary = "Get Cart",
    security(("user_id" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Cart contents"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Missing user identity"),
    ),
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<CartResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;

    let lines = state
        .app
        .carts
        .list_items(user)
        .await
        .map_err(into_status_error)?;

    let subtotal: Decimal = lines
        .iter()
        .filter_map(|line| {
            line.product
                .as_ref()
                .map(|product| product.price * Decimal::from(line.item.quantity))
        })
        .sum();

    Ok(Json(CartResponse {
        items: lines.into_iter().map(Into::into).collect(),
        subtotal: subtotal.to_string(),
    }))
}
