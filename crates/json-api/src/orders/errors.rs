//! Order Errors

use salvo::http::StatusError;
use tracing::error;

use storefront_app::domain::orders::{OrderLifecycleError, OrdersServiceError};

pub(crate) fn into_status_error(error: OrdersServiceError) -> StatusError {
    match error {
        OrdersServiceError::EmptyCart => {
            StatusError::unprocessable_entity().brief("Cart is empty")
        }
        OrdersServiceError::InvalidAddress => {
            StatusError::bad_request().brief("Delivery address must not be blank")
        }
        OrdersServiceError::InsufficientStock { product } => StatusError::conflict()
            .brief("Insufficient stock")
            .detail(format!("product {product} does not have enough stock")),
        OrdersServiceError::ProductNotFound { product } => StatusError::not_found()
            .brief("Product not found")
            .detail(format!("product {product} is no longer available")),
        OrdersServiceError::NotFound => StatusError::not_found().brief("Order not found"),
        OrdersServiceError::NotOwner => {
            StatusError::forbidden().brief("Order belongs to another user")
        }
        OrdersServiceError::Storage(source) => {
            error!("order storage failure: {source}");

            StatusError::internal_server_error()
        }
    }
}

pub(crate) fn lifecycle_status_error(error: OrderLifecycleError) -> StatusError {
    match error {
        OrderLifecycleError::NotFound => StatusError::not_found().brief("Order not found"),
        OrderLifecycleError::NotOwner => {
            StatusError::forbidden().brief("Order belongs to another user")
        }
        OrderLifecycleError::InvalidStatusTransition { current } => StatusError::conflict()
            .brief("Invalid status transition")
            .detail(format!("order is {current}")),
        OrderLifecycleError::Stock(source) => {
            error!("failed to return stock for order: {source}");

            StatusError::internal_server_error()
        }
        OrderLifecycleError::Storage(source) => {
            error!("order storage failure: {source}");

            StatusError::internal_server_error()
        }
    }
}
