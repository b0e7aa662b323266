//! Healthcheck Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{extensions::*, state::State};

/// Healthcheck response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// `ok` when the catalog can be read, `degraded` otherwise
    pub status: String,

    /// Server build version
    pub version: String,

    /// Live products in the catalog, when it could be read
    pub catalog_products: Option<usize>,

    /// Whether catalog writes and fulfilment routes accept requests
    pub operator_routes: bool,
}

/// Healthcheck handler
///
/// Reads the catalog as a liveness probe of the in-memory stores and reports
/// whether operator routes are configured. Answers 503 when the catalog
/// cannot be read.
#[endpoint(
    tags("health"),
    summary = "Health check endpoint",
    responses(
        (status_code = StatusCode::OK, description = "Serving requests"),
        (status_code = StatusCode::SERVICE_UNAVAILABLE, description = "Catalog unavailable"),
    ),
)]
pub(crate) async fn handler(
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<HealthResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let catalog_products = match state.app.products.list_products().await {
        Ok(products) => Some(products.len()),
        Err(source) => {
            warn!("healthcheck could not read the catalog: {source}");

            res.status_code(StatusCode::SERVICE_UNAVAILABLE);

            None
        }
    };

    Ok(Json(HealthResponse {
        status: if catalog_products.is_some() { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        catalog_products,
        operator_routes: state.operator_token.is_some(),
    }))
}
