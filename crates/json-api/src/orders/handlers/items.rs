//! Order Items Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::PathParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    extensions::*,
    orders::{errors::into_status_error, get::OrderItemResponse},
    state::State,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderItemsResponse {
    /// Line items with their checkout prices
    pub items: Vec<OrderItemResponse>,
}

/// Order Items Handler
#[endpoint(
    tags("orders"),
    summary = "List Order Items",
    security(("user_id" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Order items"),
        (status_code = StatusCode::FORBIDDEN, description = "Order belongs to another user"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
    ),
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<OrderItemsResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;

    let items = state
        .app
        .orders
        .get_order_items(user, order.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(OrderItemsResponse {
        items: items.into_iter().map(Into::into).collect(),
    }))
}
