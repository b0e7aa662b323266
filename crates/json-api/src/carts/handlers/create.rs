//! Add Cart Item Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::carts::{data::NewCartItem, records::CartItemRecord};

use crate::{
    carts::{errors::into_status_error, handlers::parse_quantity},
    extensions::*,
    state::State,
};

/// Add Cart Item Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct AddCartItemRequest {
    /// Product to add
    pub product_uuid: Uuid,

    /// Units to add; merged with any existing item for the product
    pub quantity: i64,
}

/// Cart Item Saved Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartItemSavedResponse {
    /// Cart item UUID
    pub uuid: Uuid,

    /// Product UUID
    pub product_uuid: Uuid,

    /// Quantity after the change
    pub quantity: u32,
}

impl From<CartItemRecord> for CartItemSavedResponse {
    fn from(item: CartItemRecord) -> Self {
        CartItemSavedResponse {
            uuid: item.uuid.into(),
            product_uuid: item.product_uuid.into(),
            quantity: item.quantity,
        }
    }
}

/// Add Cart Item Handler
#[endpoint(
    tags("cart"),
    summary = "Add Cart Item",
    security(("user_id" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Item added"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid quantity"),
        (status_code = StatusCode::NOT_FOUND, description = "Product not found"),
        (status_code = StatusCode::CONFLICT, description = "Insufficient stock"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<AddCartItemRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<CartItemSavedResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;
    let request = json.into_inner();

    let item = NewCartItem {
        product_uuid: request.product_uuid.into(),
        quantity: parse_quantity(request.quantity)?,
    };

    let item = state
        .app
        .carts
        .add_item(user, item)
        .await
        .map_err(into_status_error)?;

    res.add_header(LOCATION, format!("/cart/items/{}", item.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

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
        carts_service(carts, Router::with_path("cart/items").post(handler))
    }

    #[tokio::test]
    async fn test_add_item_returns_201_with_location() -> TestResult {
        let product = ProductUuid::new();
        let item = CartItemUuid::new();

        let mut carts = MockCartsService::new();

        carts
            .expect_add_item()
            .once()
            .withf(move |user, new| {
                *user == TEST_USER_UUID
                    && *new
                        == NewCartItem {
                            product_uuid: product,
                            quantity: 2,
                        }
            })
            .return_once(move |_, _| Ok(make_cart_item(item, product, 2)));

        carts.expect_update_quantity().never();
        carts.expect_remove_item().never();
        carts.expect_list_items().never();
        carts.expect_clear_items().never();

        let mut res = TestClient::post("http://example.com/cart/items")
            .json(&json!({ "product_uuid": product.into_uuid(), "quantity": 2 }))
            .send(&make_service(carts))
            .await;

        let body: CartItemSavedResponse = res.take_json().await?;
        let location = res.headers().get("location").and_then(|v| v.to_str().ok());

        assert_eq!(res.status_code, Some(StatusCode::CREATED));
        assert_eq!(location, Some(format!("/cart/items/{item}").as_str()));
        assert_eq!(body.quantity, 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_add_item_zero_quantity_returns_400_without_calling_service() -> TestResult {
        let res = TestClient::post("http://example.com/cart/items")
            .json(&json!({ "product_uuid": ProductUuid::new().into_uuid(), "quantity": 0 }))
            .send(&make_service(strict_carts_mock()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_add_item_insufficient_stock_returns_409() -> TestResult {
        let product = ProductUuid::new();

        let mut carts = MockCartsService::new();

        carts
            .expect_add_item()
            .once()
            .withf(move |_, new| new.product_uuid == product)
            .return_once(move |_, _| {
                Err(CartsServiceError::InsufficientStock {
                    product,
                    name: Some("Test Product".to_string()),
                })
            });

        carts.expect_update_quantity().never();
        carts.expect_remove_item().never();
        carts.expect_list_items().never();
        carts.expect_clear_items().never();

        let res = TestClient::post("http://example.com/cart/items")
            .json(&json!({ "product_uuid": product.into_uuid(), "quantity": 50 }))
            .send(&make_service(carts))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }

    #[tokio::test]
    async fn test_add_unknown_product_returns_404() -> TestResult {
        let product = ProductUuid::new();

        let mut carts = MockCartsService::new();

        carts
            .expect_add_item()
            .once()
            .return_once(move |_, _| Err(CartsServiceError::ProductNotFound { product }));

        carts.expect_update_quantity().never();
        carts.expect_remove_item().never();
        carts.expect_list_items().never();
        carts.expect_clear_items().never();

        let res = TestClient::post("http://example.com/cart/items")
            .json(&json!({ "product_uuid": product.into_uuid(), "quantity": 1 }))
            .send(&make_service(carts))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }
}
