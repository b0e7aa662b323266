//! Create Order Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::orders::data::NewOrder;

use crate::{
    extensions::*,
    orders::{errors::into_status_error, get::OrderResponse},
    state::State,
};

/// Header carrying the client-chosen retry key.
pub(crate) const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Create Order Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateOrderRequest {
    /// Where the order should be delivered
    pub delivery_address: String,
}

fn idempotency_key(req: &Request) -> Result<Option<Uuid>, StatusError> {
    req.header::<String>(IDEMPOTENCY_KEY_HEADER)
        .map(|value| Uuid::parse_str(value.trim()))
        .transpose()
        .or_400("Idempotency-Key must be a UUID")
}

/// Create Order Handler
///
/// Checks out the user's cart. Retrying with the same `Idempotency-Key`
/// returns the order the first attempt created.
#[endpoint(
    tags("orders"),
    summary = "Create Order",
    security(("user_id" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Order created"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid address or idempotency key"),
        (status_code = StatusCode::NOT_FOUND, description = "A cart product no longer exists"),
        (status_code = StatusCode::CONFLICT, description = "Insufficient stock"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Cart is empty"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    req: &mut Request,
    json: JsonBody<CreateOrderRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;

    let order = NewOrder {
        delivery_address: json.into_inner().delivery_address,
        idempotency_key: idempotency_key(req)?,
    };

    let order = state
        .app
        .orders
        .create_order(user, order)
        .await
        .map_err(into_status_error)?;

    res.add_header(LOCATION, format!("/orders/{}", order.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(order.into()))
}
