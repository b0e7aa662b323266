//! Update Cart Item Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    carts::{create::CartItemSavedResponse, errors::into_status_error, handlers::parse_quantity},
    extensions::*,
    state::State,
};

/// Update Cart Item Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UpdateCartItemRequest {
    /// Replacement quantity
    pub quantity: i64,
}

/// Update Cart Item Handler
///
/// Replaces the item's quantity after checking it against current stock.
#[endpoint(
    tags("cart"),
    summary = "Update Cart Item",
    security(("user_id" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Quantity updated"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid quantity"),
        (status_code = StatusCode::NOT_FOUND, description = "Cart item not found"),
        (status_code = StatusCode::CONFLICT, description = "Insufficient stock"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    item: PathParam<Uuid>,
    json: JsonBody<UpdateCartItemRequest>,
    depot: &mut Depot,
) -> Result<Json<CartItemSavedResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;
    let quantity = parse_quantity(json.into_inner().quantity)?;

    let item = state
        .app
        .carts
        .update_quantity(user, item.into_inner().into(), quantity)
        .await
        .map_err(into_status_error)?;

    Ok(Json(item.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use storefront_app::domain::{
        carts::{CartsServiceError, MockCartsService, records::CartItemUuid},
        products::records::ProductUuid,
    };

    use crate::test_helpers::{TEST_USER_UUID, carts_service, make_cart_item, strict_carts_mock};

    use super::*;

    fn make_service(carts: MockCartsService) -> Service {
        carts_service(carts, Router::with_path("cart/items/{item}").put(handler))
    }

    #[tokio::test]
    async fn test_update_quantity_success() -> TestResult {
        let item = CartItemUuid::new();
        let product = ProductUuid::new();

        let mut carts = MockCartsService::new();

        carts
            .expect_update_quantity()
            .once()
            .withf(move |user, i, quantity| *user == TEST_USER_UUID && *i == item && *quantity == 4)
            .return_once(move |_, _, _| Ok(make_cart_item(item, product, 4)));

        carts.expect_add_item().never();
        carts.expect_remove_item().never();
        carts.expect_list_items().never();
        carts.expect_clear_items().never();

        let mut res = TestClient::put(format!("http://example.com/cart/items/{item}"))
            .json(&json!({ "quantity": 4 }))
            .send(&make_service(carts))
            .await;

        let body: CartItemSavedResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.quantity, 4);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_negative_quantity_returns_400() -> TestResult {
        let res = TestClient::put(format!("http://example.com/cart/items/{}", CartItemUuid::new()))
            .json(&json!({ "quantity": -1 }))
            .send(&make_service(strict_carts_mock()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_above_stock_returns_409() -> TestResult {
        let item = CartItemUuid::new();
        let product = ProductUuid::new();

        let mut carts = MockCartsService::new();

        carts
            .expect_update_quantity()
            .once()
            .withf(move |_, i, _| *i == item)
            .return_once(move |_, _, _| {
                Err(CartsServiceError::InsufficientStock {
                    product,
                    name: Some("Test Product".to_string()),
                })
            });

        carts.expect_add_item().never();
        carts.expect_remove_item().never();
        carts.expect_list_items().never();
        carts.expect_clear_items().never();

        let res = TestClient::put(format!("http://example.com/cart/items/{item}"))
            .json(&json!({ "quantity": 99 }))
            .send(&make_service(carts))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }
}
