//! Order Data

use uuid::Uuid;

/// New Order Data
///
/// Supplying an `idempotency_key` makes the submission safe to retry: a
/// second submission with the same key returns the order the first one
/// created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub delivery_address: String,
    pub idempotency_key: Option<Uuid>,
}
