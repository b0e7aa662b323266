//! Deliver Order Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    extensions::*,
    orders::{errors::lifecycle_status_error, get::OrderResponse},
    state::State,
};

/// Deliver Order Handler
#[endpoint(
    tags("operator"),
    summary = "Mark Order Delivered",
    security(("operator_token" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Order delivered"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::CONFLICT, description = "Order is not shipped"),
    ),
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let order = state
        .app
        .lifecycle
        .deliver_order(order.into_inner().into())
        .await
        .map_err(lifecycle_status_error)?;

    Ok(Json(order.into()))
}
