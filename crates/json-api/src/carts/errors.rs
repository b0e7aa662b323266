//! Cart Errors

use salvo::http::StatusError;
use tracing::error;

use storefront_app::domain::carts::CartsServiceError;

pub(crate) fn into_status_error(error: CartsServiceError) -> StatusError {
    match error {
        CartsServiceError::InvalidQuantity => {
            StatusError::bad_request().brief("Quantity must be at least one")
        }
        CartsServiceError::InsufficientStock { product, name } => StatusError::conflict()
            .brief("Insufficient stock")
            .detail(match name {
                Some(name) => format!("{name} ({product}) does not have enough stock"),
                None => format!("product {product} does not have enough stock"),
            }),
        CartsServiceError::ProductNotFound { product } => StatusError::not_found()
            .brief("Product not found")
            .detail(format!("product {product} does not exist")),
        CartsServiceError::NotFound => StatusError::not_found().brief("Cart item not found"),
        CartsServiceError::Storage(source) => {
            error!("cart storage failure: {source}");

            StatusError::internal_server_error()
        }
    }
}
