//! Domain event consumer.
//!
//! Logs every event published on the bus and feeds the domain counters.

use std::sync::Arc;

use tokio::{
    sync::broadcast::{Receiver, error::RecvError},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use storefront_app::domain::events::{EventBus, ShopEvent};

use super::metrics;

/// Subscribe to `events` and consume it on a background task until the bus
/// is dropped.
pub(crate) fn spawn_event_consumer(events: &Arc<dyn EventBus>) -> JoinHandle<()> {
    let receiver = events.subscribe();

    tokio::spawn(consume(receiver))
}

async fn consume(mut receiver: Receiver<ShopEvent>) {
    loop {
        match receiver.recv().await {
            Ok(event) => {
                log_event(&event);
                metrics::record_event(&event);
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "event consumer lagged behind the bus");
            }
            Err(RecvError::Closed) => {
                debug!("event bus closed, stopping consumer");

                return;
            }
        }
    }
}

fn log_event(event: &ShopEvent) {
    match event {
        ShopEvent::StockRejected {
            product_uuid,
            requested,
        } => {
            warn!(event = event.name(), product_uuid = %product_uuid, requested, "shop event");
        }
        ShopEvent::CartClearFailed {
            user_uuid,
            order_uuid,
        } => {
            warn!(
                event = event.name(),
                user_uuid = %user_uuid,
                order_uuid = %order_uuid,
                "cart still holds items of a committed order"
            );
        }
        ShopEvent::CartItemAdded { .. }
        | ShopEvent::CartItemUpdated { .. }
        | ShopEvent::CartItemRemoved { .. } => {
            debug!(event = event.name(), ?event, "shop event");
        }
        _ => {
            info!(event = event.name(), ?event, "shop event");
        }
    }
}
