//! Test helpers.

use std::sync::Arc;

use jiff::Timestamp;
use rust_decimal::Decimal;
use salvo::{affix_state::inject, prelude::*};
use uuid::Uuid;

use storefront_app::{
    context::AppContext,
    domain::{
        carts::{
            MockCartsService,
            records::{CartItemRecord, CartItemUuid},
        },
        events::MockEventBus,
        orders::{
            MockOrderLifecycle, MockOrdersService,
            records::{OrderItemRecord, OrderItemUuid, OrderRecord, OrderStatus, OrderUuid},
        },
        products::{
            MockProductsService,
            records::{ProductRecord, ProductUuid},
        },
        users::UserUuid,
    },
};

use crate::{extensions::*, state::State};

pub(crate) const TEST_USER_UUID: UserUuid = UserUuid::from_uuid(Uuid::nil());

pub(crate) const TEST_OPERATOR_TOKEN: &str = "operator-secret";

#[salvo::handler]
pub(crate) async fn inject_user(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_user_uuid(TEST_USER_UUID);
    ctrl.call_next(req, depot, res).await;
}

pub(crate) fn make_product(uuid: ProductUuid) -> ProductRecord {
    ProductRecord {
        uuid,
        name: "Test Product".to_string(),
        price: Decimal::new(1099, 2),
        stock_quantity: 5,
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
        deleted_at: None,
    }
}

pub(crate) fn make_cart_item(uuid: CartItemUuid, product: ProductUuid, quantity: u32) -> CartItemRecord {
    CartItemRecord {
        uuid,
        user_uuid: TEST_USER_UUID,
        product_uuid: product,
        quantity,
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
    }
}

pub(crate) fn make_order(uuid: OrderUuid, status: OrderStatus) -> OrderRecord {
    let product = ProductUuid::from_uuid(Uuid::from_u128(7));

    OrderRecord {
        uuid,
        user_uuid: TEST_USER_UUID,
        status,
        order_date: Timestamp::UNIX_EPOCH,
        delivery_address: "1 Main Street".to_string(),
        total_amount: Decimal::new(2198, 2),
        idempotency_key: None,
        items: vec![OrderItemRecord {
            uuid: OrderItemUuid::from_uuid(Uuid::from_u128(8)),
            order_uuid: uuid,
            product_uuid: product,
            quantity: 2,
            price: Decimal::new(1099, 2),
        }],
        updated_at: Timestamp::UNIX_EPOCH,
    }
}

pub(crate) fn strict_products_mock() -> MockProductsService {
    let mut products = MockProductsService::new();

    products.expect_list_products().never();
    products.expect_get_product().never();
    products.expect_create_product().never();
    products.expect_update_product().never();
    products.expect_delete_product().never();

    products
}

pub(crate) fn strict_carts_mock() -> MockCartsService {
    let mut carts = MockCartsService::new();

    carts.expect_add_item().never();
    carts.expect_update_quantity().never();
    carts.expect_remove_item().never();
    carts.expect_list_items().never();
    carts.expect_clear_items().never();

    carts
}

pub(crate) fn strict_orders_mock() -> MockOrdersService {
    let mut orders = MockOrdersService::new();

    orders.expect_create_order().never();
    orders.expect_get_order().never();
    orders.expect_list_orders().never();
    orders.expect_get_order_items().never();
    orders.expect_find_order_by_idempotency_key().never();

    orders
}

pub(crate) fn strict_lifecycle_mock() -> MockOrderLifecycle {
    let mut lifecycle = MockOrderLifecycle::new();

    lifecycle.expect_cancel_order().never();
    lifecycle.expect_ship_order().never();
    lifecycle.expect_deliver_order().never();

    lifecycle
}

fn strict_events_mock() -> MockEventBus {
    let mut events = MockEventBus::new();

    events.expect_publish().never();
    events.expect_subscribe().never();

    events
}

/// Mocks for every service; tests replace the one they exercise.
pub(crate) struct Mocks {
    pub(crate) products: MockProductsService,
    pub(crate) carts: MockCartsService,
    pub(crate) orders: MockOrdersService,
    pub(crate) lifecycle: MockOrderLifecycle,
}

impl Default for Mocks {
    fn default() -> Self {
        Self {
            products: strict_products_mock(),
            carts: strict_carts_mock(),
            orders: strict_orders_mock(),
            lifecycle: strict_lifecycle_mock(),
        }
    }
}

impl Mocks {
    pub(crate) fn into_state(self, operator_token: Option<String>) -> Arc<State> {
        let app = AppContext {
            products: Arc::new(self.products),
            carts: Arc::new(self.carts),
            orders: Arc::new(self.orders),
            lifecycle: Arc::new(self.lifecycle),
            events: Arc::new(strict_events_mock()),
        };

        State::shared(app, operator_token)
    }
}

pub(crate) fn strict_state() -> Arc<State> {
    strict_state_with_token(Some(TEST_OPERATOR_TOKEN.to_string()))
}

pub(crate) fn strict_state_with_token(operator_token: Option<String>) -> Arc<State> {
    Mocks::default().into_state(operator_token)
}

/// Service with the user already authenticated.
pub(crate) fn user_service(mocks: Mocks, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(mocks.into_state(Some(TEST_OPERATOR_TOKEN.to_string()))))
            .hoop(inject_user)
            .push(route),
    )
}

pub(crate) fn products_service(products: MockProductsService, route: Router) -> Service {
    user_service(
        Mocks {
            products,
            ..Mocks::default()
        },
        route,
    )
}

pub(crate) fn carts_service(carts: MockCartsService, route: Router) -> Service {
    user_service(
        Mocks {
            carts,
            ..Mocks::default()
        },
        route,
    )
}

pub(crate) fn orders_service(orders: MockOrdersService, route: Router) -> Service {
    user_service(
        Mocks {
            orders,
            ..Mocks::default()
        },
        route,
    )
}

pub(crate) fn lifecycle_service(lifecycle: MockOrderLifecycle, route: Router) -> Service {
    user_service(
        Mocks {
            lifecycle,
            ..Mocks::default()
        },
        route,
    )
}
