//! Shop events.
//!
//! Cart, order and catalog changes are published on an [`EventBus`] after the
//! corresponding state change has been committed. Publishing is fire and
//! forget: a bus with no subscribers drops the event and the request that
//! produced it still succeeds.

use std::fmt;

use mockall::automock;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

use crate::domain::{
    carts::records::CartItemUuid,
    orders::records::{OrderStatus, OrderUuid},
    products::records::ProductUuid,
    users::UserUuid,
};

/// Something that happened in the shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShopEvent {
    CartItemAdded {
        user_uuid: UserUuid,
        item_uuid: CartItemUuid,
        product_uuid: ProductUuid,
        quantity: u32,
    },
    CartItemUpdated {
        user_uuid: UserUuid,
        item_uuid: CartItemUuid,
        quantity: u32,
    },
    CartItemRemoved {
        user_uuid: UserUuid,
        item_uuid: CartItemUuid,
    },
    OrderCreated {
        user_uuid: UserUuid,
        order_uuid: OrderUuid,
        items: usize,
    },
    OrderCancelled {
        user_uuid: UserUuid,
        order_uuid: OrderUuid,
    },
    /// The order was committed but the cart it came from still holds its
    /// items; a plain resubmission would order them again.
    CartClearFailed {
        user_uuid: UserUuid,
        order_uuid: OrderUuid,
    },
    OrderShipped {
        order_uuid: OrderUuid,
    },
    OrderDelivered {
        order_uuid: OrderUuid,
    },
    ProductUpdated {
        product_uuid: ProductUuid,
    },
    ProductDeleted {
        product_uuid: ProductUuid,
    },
    StockRejected {
        product_uuid: ProductUuid,
        requested: u32,
    },
}

impl ShopEvent {
    /// Stable snake case name, used as a metrics label.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CartItemAdded { .. } => "cart_item_added",
            Self::CartItemUpdated { .. } => "cart_item_updated",
            Self::CartItemRemoved { .. } => "cart_item_removed",
            Self::OrderCreated { .. } => "order_created",
            Self::OrderCancelled { .. } => "order_cancelled",
            Self::CartClearFailed { .. } => "cart_clear_failed",
            Self::OrderShipped { .. } => "order_shipped",
            Self::OrderDelivered { .. } => "order_delivered",
            Self::ProductUpdated { .. } => "product_updated",
            Self::ProductDeleted { .. } => "product_deleted",
            Self::StockRejected { .. } => "stock_rejected",
        }
    }

    /// Status an order moved into, for order transition events.
    pub fn order_status(&self) -> Option<OrderStatus> {
        match self {
            Self::OrderCreated { .. } => Some(OrderStatus::Processing),
            Self::OrderCancelled { .. } => Some(OrderStatus::Cancelled),
            Self::OrderShipped { .. } => Some(OrderStatus::Shipped),
            Self::OrderDelivered { .. } => Some(OrderStatus::Delivered),
            _ => None,
        }
    }
}

#[automock]
pub trait EventBus: Send + Sync {
    /// Broadcast `event` to every current subscriber.
    fn publish(&self, event: ShopEvent);

    /// Receive every event published from now on.
    fn subscribe(&self) -> broadcast::Receiver<ShopEvent>;
}

/// [`EventBus`] backed by a `tokio` broadcast channel.
///
/// Slow subscribers lag and lose the oldest events once `capacity` is
/// exceeded.
#[derive(Clone)]
pub struct BroadcastEventBus {
    tx: broadcast::Sender<ShopEvent>,
}

impl BroadcastEventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));

        Self { tx }
    }
}

impl EventBus for BroadcastEventBus {
    fn publish(&self, event: ShopEvent) {
        let name = event.name();

        if self.tx.send(event).is_err() {
            trace!(event = name, "no event subscribers");
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<ShopEvent> {
        self.tx.subscribe()
    }
}

impl fmt::Debug for BroadcastEventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BroadcastEventBus")
            .field("subscribers", &self.tx.receiver_count())
            .finish()
    }
}
