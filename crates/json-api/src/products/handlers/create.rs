//! Create Product Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::products::data::NewProduct;

use crate::{
    extensions::*,
    products::{errors::into_status_error, handlers::parse_price},
    state::State,
};

/// Create Product Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateProductRequest {
    /// Optional client-chosen uuid; generated when omitted
    pub uuid: Option<Uuid>,

    /// Display name
    pub name: String,

    /// Unit price as a decimal string
    pub price: String,

    /// Initial stock level
    #[serde(default)]
    pub stock_quantity: u32,
}

/// Product Created Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ProductCreatedResponse {
    /// Created product UUID
    pub uuid: Uuid,
}

/// Create Product Handler
#[endpoint(
    tags("products"),
    summary = "Create Product",
    security(("operator_token" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Product created"),
        (status_code = StatusCode::CONFLICT, description = "Product already exists"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<CreateProductRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<ProductCreatedResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let request = json.into_inner();

    let product = NewProduct {
        uuid: request.uuid.map_or_else(Default::default, Into::into),
        name: request.name,
        price: parse_price(&request.price)?,
        stock_quantity: request.stock_quantity,
    };

    let uuid = state
        .app
        .products
        .create_product(product)
        .await
        .map_err(into_status_error)?
        .uuid;

    res.add_header(LOCATION, format!("/products/{uuid}"), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(ProductCreatedResponse { uuid: uuid.into() }))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use storefront_app::domain::products::{
        MockProductsService, ProductsServiceError, records::ProductUuid,
    };

    use crate::test_helpers::{make_product, products_service};

    use super::*;

    fn make_service(products: MockProductsService) -> Service {
        products_service(products, Router::with_path("products").post(handler))
    }

    #[tokio::test]
    async fn test_create_product_success() -> TestResult {
        let uuid = ProductUuid::new();
        let product = make_product(uuid);

        let mut products = MockProductsService::new();

        products
            .expect_create_product()
            .once()
            .withf(move |new| {
                *new == NewProduct {
                    uuid,
                    name: "Test Product".to_string(),
                    price: Decimal::new(1099, 2),
                    stock_quantity: 5,
                }
            })
            .return_once(move |_| Ok(product));

        products.expect_get_product().never();
        products.expect_list_products().never();
        products.expect_update_product().never();
        products.expect_delete_product().never();

        let mut res = TestClient::post("http://example.com/products")
            .json(&json!({
                "uuid": uuid.into_uuid(),
                "name": "Test Product",
                "price": "10.99",
                "stock_quantity": 5
            }))
            .send(&make_service(products))
            .await;

        let body: ProductCreatedResponse = res.take_json().await?;
        let location = res.headers().get("location").and_then(|v| v.to_str().ok());

        assert_eq!(res.status_code, Some(StatusCode::CREATED));
        assert_eq!(location, Some(format!("/products/{uuid}").as_str()));
        assert_eq!(body.uuid, uuid.into_uuid());

        Ok(())
    }

    #[tokio::test]
    async fn test_create_product_conflict_returns_409() -> TestResult {
        let uuid = ProductUuid::new();

        let mut products = MockProductsService::new();

        products
            .expect_create_product()
            .once()
            .withf(move |new| new.uuid == uuid)
            .return_once(|_| Err(ProductsServiceError::AlreadyExists));

        products.expect_get_product().never();
        products.expect_list_products().never();
        products.expect_update_product().never();
        products.expect_delete_product().never();

        let res = TestClient::post("http://example.com/products")
            .json(&json!({ "uuid": uuid.into_uuid(), "name": "Lamp", "price": "1.00" }))
            .send(&make_service(products))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_product_negative_price_returns_400() -> TestResult {
        let mut products = MockProductsService::new();

        products
            .expect_create_product()
            .once()
            .withf(|new| new.price == Decimal::new(-1, 0))
            .return_once(|_| Err(ProductsServiceError::InvalidPrice));

        products.expect_get_product().never();
        products.expect_list_products().never();
        products.expect_update_product().never();
        products.expect_delete_product().never();

        let res = TestClient::post("http://example.com/products")
            .json(&json!({ "name": "Lamp", "price": "-1" }))
            .send(&make_service(products))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_product_unparseable_price_returns_400() -> TestResult {
        let mut products = MockProductsService::new();

        products.expect_create_product().never();
        products.expect_get_product().never();
        products.expect_list_products().never();
        products.expect_update_product().never();
        products.expect_delete_product().never();

        let res = TestClient::post("http://example.com/products")
            .json(&json!({ "name": "Lamp", "price": "cheap" }))
            .send(&make_service(products))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_product_blank_name_returns_400() -> TestResult {
        let mut products = MockProductsService::new();

        products
            .expect_create_product()
            .once()
            .withf(|new| new.name.trim().is_empty())
            .return_once(|_| Err(ProductsServiceError::InvalidName));

        products.expect_get_product().never();
        products.expect_list_products().never();
        products.expect_update_product().never();
        products.expect_delete_product().never();

        let res = TestClient::post("http://example.com/products")
            .json(&json!({ "name": " ", "price": "2.00" }))
            .send(&make_service(products))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
