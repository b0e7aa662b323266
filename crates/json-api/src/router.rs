//! App Router

use salvo::Router;

use crate::{auth, carts, orders, products};

/// Catalog reads are public, shopper routes need `X-User-Id`, and
/// catalog writes and fulfilment need the operator token.
pub fn app_router() -> Router {
    Router::new()
        .push(
            Router::with_path("products")
                .get(products::index::handler)
                .push(Router::with_path("{product}").get(products::get::handler)),
        )
        .push(
            Router::new()
                .hoop(auth::middleware::handler)
                .push(
                    Router::with_path("cart")
                        .get(carts::index::handler)
                        .push(
                            Router::with_path("items")
                                .post(carts::create::handler)
                                .push(
                                    Router::with_path("{item}")
                                        .put(carts::update::handler)
                                        .delete(carts::delete::handler),
                                ),
                        ),
                )
                .push(
                    Router::with_path("orders")
                        .get(orders::index::handler)
                        .post(orders::create::handler)
                        .push(
                            Router::with_path("{order}")
                                .get(orders::get::handler)
                                .push(Router::with_path("items").get(orders::items::handler))
                                .push(Router::with_path("cancel").post(orders::cancel::handler)),
                        ),
                ),
        )
        .push(
            Router::new()
                .hoop(auth::operator::handler)
                .push(
                    Router::with_path("products")
                        .post(products::create::handler)
                        .push(
                            Router::with_path("{product}")
                                .put(products::update::handler)
                                .delete(products::delete::handler),
                        ),
                )
                .push(
                    Router::with_path("operator/orders/{order}")
                        .push(Router::with_path("ship").post(orders::ship::handler))
                        .push(Router::with_path("deliver").post(orders::deliver::handler)),
                ),
        )
}
