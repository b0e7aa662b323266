//! Ship Order Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    extensions::*,
    orders::{errors::lifecycle_status_error, get::OrderResponse},
    state::State,
};

/// Ship Order Handler
#[endpoint(
    tags("operator"),
    summary = "Mark Order Shipped",
    security(("operator_token" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Order shipped"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::CONFLICT, description = "Order is not processing"),
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
        .ship_order(order.into_inner().into())
        .await
        .map_err(lifecycle_status_error)?;

    Ok(Json(order.into()))
}
