//! Cancel Order Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    extensions::*,
    orders::{errors::lifecycle_status_error, get::OrderResponse},
    state::State,
};

/// Cancel Order Handler
///
/// Cancels a processing order and returns its units to stock.
#[endpoint(
    tags("orders"),
    summary = "Cancel Order",
    security(("user_id" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Order cancelled"),
        (status_code = StatusCode::FORBIDDEN, description = "Order belongs to another user"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::CONFLICT, description = "Order can no longer be cancelled"),
    ),
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;

    let order = state
        .app
        .lifecycle
        .cancel_order(user, order.into_inner().into())
        .await
        .map_err(lifecycle_status_error)?;

    Ok(Json(order.into()))
}
