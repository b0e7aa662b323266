//! Stock ledger.

use std::{collections::BTreeMap, fmt, sync::Arc};

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, error, warn};

use crate::domain::{
    products::records::ProductUuid,
    stock::{
        data::{Reservation, StockLine},
        errors::StockError,
    },
};

type Level = Arc<Mutex<u32>>;

/// Locked cells for one multi-product operation, in canonical order.
type LockedLevels = SmallVec<[(ProductUuid, u32, OwnedMutexGuard<u32>); 8]>;

/// Per-product available stock.
///
/// Every product owns its own mutex. Operations spanning several products
/// lock them in ascending [`ProductUuid`] order and re-read each level only
/// after its lock is held, so overlapping reservations neither deadlock nor
/// act on stale availability.
#[derive(Default)]
pub struct StockLedger {
    levels: RwLock<FxHashMap<ProductUuid, Level>>,
}

impl StockLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `product` with `quantity` units, or overwrite its level
    /// when it is already tracked.
    pub async fn register(&self, product: ProductUuid, quantity: u32) {
        let existing = {
            let mut levels = self.levels.write().await;

            match levels.get(&product) {
                Some(level) => Some(Arc::clone(level)),
                None => {
                    levels.insert(product, Arc::new(Mutex::new(quantity)));

                    None
                }
            }
        };

        if let Some(level) = existing {
            *level.lock().await = quantity;
        }

        debug!(product_uuid = %product, quantity, "registered stock level");
    }

    /// Start tracking `product` with `quantity` units unless it is already
    /// tracked. Returns whether the product was newly tracked.
    pub async fn track(&self, product: ProductUuid, quantity: u32) -> bool {
        let mut levels = self.levels.write().await;

        if levels.contains_key(&product) {
            return false;
        }

        levels.insert(product, Arc::new(Mutex::new(quantity)));

        debug!(product_uuid = %product, quantity, "tracking stock level");

        true
    }

    /// Stop tracking `product`.
    pub async fn forget(&self, product: ProductUuid) {
        if self.levels.write().await.remove(&product).is_some() {
            debug!(product_uuid = %product, "stopped tracking stock level");
        }
    }

    /// Replace the level of an already tracked product.
    ///
    /// # Errors
    ///
    /// Returns [`StockError::UnknownProduct`] when the product is not tracked.
    pub async fn set_level(&self, product: ProductUuid, quantity: u32) -> Result<(), StockError> {
        let level = self
            .level_cell(product)
            .await
            .ok_or(StockError::UnknownProduct { product })?;

        *level.lock().await = quantity;

        Ok(())
    }

    /// Current level of `product`, if tracked.
    pub async fn level(&self, product: ProductUuid) -> Option<u32> {
        let level = self.level_cell(product).await?;

        let quantity = *level.lock().await;

        Some(quantity)
    }

    /// Advisory check: are `quantity` units of `product` available right now?
    ///
    /// Nothing is reserved; the answer may be stale by the time an order is
    /// committed.
    pub async fn check_available(&self, product: ProductUuid, quantity: u32) -> bool {
        self.level(product)
            .await
            .is_some_and(|available| quantity <= available)
    }

    /// Atomically take every line out of stock, or nothing at all.
    ///
    /// # Errors
    ///
    /// - [`StockError::Insufficient`] for the first product (in canonical
    ///   order) that cannot cover its requested quantity;
    /// - [`StockError::UnknownProduct`] when a product is not tracked;
    /// - [`StockError::Overflow`] when merged quantities for one product
    ///   exceed `u32::MAX`.
    ///
    /// No level is modified when an error is returned.
    pub async fn reserve_many(&self, lines: &[StockLine]) -> Result<Reservation, StockError> {
        let requested = merge_lines(lines)?;
        let mut locked = self.lock_levels(&requested).await?;

        let mut remaining: SmallVec<[u32; 8]> = SmallVec::with_capacity(locked.len());

        for (product, quantity, level) in &locked {
            let Some(left) = level.checked_sub(*quantity) else {
                warn!(
                    product_uuid = %product,
                    requested = quantity,
                    available = **level,
                    "stock reservation rejected"
                );

                return Err(StockError::Insufficient {
                    product: *product,
                    requested: *quantity,
                    available: **level,
                });
            };

            remaining.push(left);
        }

        for ((_, _, level), left) in locked.iter_mut().zip(remaining) {
            **level = left;
        }

        let reservation = Reservation::new(
            locked
                .iter()
                .map(|(product, quantity, _)| StockLine::new(*product, *quantity))
                .collect(),
        );

        debug!(lines = reservation.lines().len(), "reserved stock");

        Ok(reservation)
    }

    /// Atomically put every line back into stock.
    ///
    /// # Errors
    ///
    /// Restoring stock only fails on invariant violations: an untracked
    /// product ([`StockError::UnknownProduct`]) or counter overflow
    /// ([`StockError::Overflow`]). No level is modified in either case.
    pub async fn release_many(&self, lines: &[StockLine]) -> Result<(), StockError> {
        let requested = merge_lines(lines).inspect_err(|source| {
            error!("stock release rejected: {source}");
        })?;

        let mut locked = self
            .lock_levels(&requested)
            .await
            .inspect_err(|source| error!("stock release rejected: {source}"))?;

        let mut restored: SmallVec<[u32; 8]> = SmallVec::with_capacity(locked.len());

        for (product, quantity, level) in &locked {
            let Some(total) = level.checked_add(*quantity) else {
                error!(product_uuid = %product, "stock release would overflow");

                return Err(StockError::Overflow { product: *product });
            };

            restored.push(total);
        }

        for ((_, _, level), total) in locked.iter_mut().zip(restored) {
            **level = total;
        }

        debug!(lines = locked.len(), "released stock");

        Ok(())
    }

    async fn level_cell(&self, product: ProductUuid) -> Option<Level> {
        self.levels.read().await.get(&product).map(Arc::clone)
    }

    /// Lock the level of every requested product in ascending uuid order.
    async fn lock_levels(
        &self,
        requested: &BTreeMap<ProductUuid, u32>,
    ) -> Result<LockedLevels, StockError> {
        let cells = {
            let levels = self.levels.read().await;

            requested
                .iter()
                .map(|(product, quantity)| {
                    levels
                        .get(product)
                        .map(|level| (*product, *quantity, Arc::clone(level)))
                        .ok_or(StockError::UnknownProduct { product: *product })
                })
                .collect::<Result<SmallVec<[_; 8]>, _>>()?
        };

        let mut locked = LockedLevels::with_capacity(cells.len());

        for (product, quantity, level) in cells {
            locked.push((product, quantity, level.lock_owned().await));
        }

        Ok(locked)
    }
}

impl fmt::Debug for StockLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StockLedger").finish_non_exhaustive()
    }
}

/// Sum quantities per product; the map's ordering is the canonical lock order.
fn merge_lines(lines: &[StockLine]) -> Result<BTreeMap<ProductUuid, u32>, StockError> {
    let mut merged = BTreeMap::new();

    for line in lines {
        let quantity = merged.entry(line.product_uuid).or_insert(0_u32);

        *quantity = quantity
            .checked_add(line.quantity)
            .ok_or(StockError::Overflow {
                product: line.product_uuid,
            })?;
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use testresult::TestResult;
    use tokio::time::timeout;

    use super::*;

    async fn ledger_with(levels: &[(ProductUuid, u32)]) -> StockLedger {
        let ledger = StockLedger::new();

        for (product, quantity) in levels {
            ledger.register(*product, *quantity).await;
        }

        ledger
    }

    #[tokio::test]
    async fn check_available_compares_against_current_level() {
        let product = ProductUuid::new();
        let ledger = ledger_with(&[(product, 3)]).await;

        assert!(ledger.check_available(product, 3).await);
        assert!(!ledger.check_available(product, 4).await);
        assert!(!ledger.check_available(ProductUuid::new(), 1).await);
    }

    #[tokio::test]
    async fn reserve_many_decrements_every_line() -> TestResult {
        let a = ProductUuid::new();
        let b = ProductUuid::new();
        let ledger = ledger_with(&[(a, 5), (b, 2)]).await;

        let reservation = ledger
            .reserve_many(&[StockLine::new(a, 3), StockLine::new(b, 2)])
            .await?;

        assert_eq!(ledger.level(a).await, Some(2));
        assert_eq!(ledger.level(b).await, Some(0));
        assert_eq!(reservation.lines().len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn reserve_many_is_all_or_nothing() {
        let a = ProductUuid::new();
        let b = ProductUuid::new();
        let ledger = ledger_with(&[(a, 5), (b, 1)]).await;

        let result = ledger
            .reserve_many(&[StockLine::new(a, 3), StockLine::new(b, 2)])
            .await;

        assert_eq!(
            result,
            Err(StockError::Insufficient {
                product: b,
                requested: 2,
                available: 1,
            })
        );
        assert_eq!(ledger.level(a).await, Some(5));
        assert_eq!(ledger.level(b).await, Some(1));
    }

    #[tokio::test]
    async fn reserve_many_merges_duplicate_products() {
        let product = ProductUuid::new();
        let ledger = ledger_with(&[(product, 3)]).await;

        let result = ledger
            .reserve_many(&[StockLine::new(product, 2), StockLine::new(product, 2)])
            .await;

        assert!(
            matches!(result, Err(StockError::Insufficient { requested: 4, .. })),
            "expected merged request of 4 to fail, got {result:?}"
        );
        assert_eq!(ledger.level(product).await, Some(3));
    }

    #[tokio::test]
    async fn reserve_many_rejects_untracked_products() {
        let known = ProductUuid::new();
        let unknown = ProductUuid::new();
        let ledger = ledger_with(&[(known, 5)]).await;

        let result = ledger
            .reserve_many(&[StockLine::new(known, 1), StockLine::new(unknown, 1)])
            .await;

        assert_eq!(result, Err(StockError::UnknownProduct { product: unknown }));
        assert_eq!(ledger.level(known).await, Some(5));
    }

    #[tokio::test]
    async fn release_many_restores_reserved_quantities() -> TestResult {
        let a = ProductUuid::new();
        let b = ProductUuid::new();
        let ledger = ledger_with(&[(a, 4), (b, 9)]).await;

        let reservation = ledger
            .reserve_many(&[StockLine::new(a, 4), StockLine::new(b, 1)])
            .await?;

        ledger.release_many(reservation.lines()).await?;

        assert_eq!(ledger.level(a).await, Some(4));
        assert_eq!(ledger.level(b).await, Some(9));

        Ok(())
    }

    #[tokio::test]
    async fn release_many_overflow_changes_nothing() {
        let a = ProductUuid::new();
        let b = ProductUuid::new();
        let ledger = ledger_with(&[(a, 1), (b, u32::MAX)]).await;

        let result = ledger
            .release_many(&[StockLine::new(a, 1), StockLine::new(b, 1)])
            .await;

        assert_eq!(result, Err(StockError::Overflow { product: b }));
        assert_eq!(ledger.level(a).await, Some(1));
    }

    #[tokio::test]
    async fn set_level_requires_tracked_product() {
        let ledger = StockLedger::new();
        let product = ProductUuid::new();

        assert_eq!(
            ledger.set_level(product, 1).await,
            Err(StockError::UnknownProduct { product })
        );

        ledger.register(product, 1).await;

        assert_eq!(ledger.set_level(product, 7).await, Ok(()));
        assert_eq!(ledger.level(product).await, Some(7));
    }

    #[tokio::test]
    async fn track_never_overwrites_an_existing_level() {
        let ledger = StockLedger::new();
        let product = ProductUuid::new();

        assert!(ledger.track(product, 3).await);
        assert!(!ledger.track(product, 9).await);
        assert_eq!(ledger.level(product).await, Some(3));

        ledger.forget(product).await;

        assert_eq!(ledger.level(product).await, None);
        assert!(ledger.track(product, 9).await);
        assert_eq!(ledger.level(product).await, Some(9));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn overlapping_reservations_in_opposite_order_do_not_deadlock() -> TestResult {
        let a = ProductUuid::new();
        let b = ProductUuid::new();
        let ledger = Arc::new(ledger_with(&[(a, 1_000), (b, 1_000)]).await);

        let forward = {
            let ledger = Arc::clone(&ledger);

            tokio::spawn(async move {
                for _ in 0..200 {
                    let reservation = ledger
                        .reserve_many(&[StockLine::new(a, 1), StockLine::new(b, 1)])
                        .await?;

                    ledger.release_many(reservation.lines()).await?;
                }

                Ok::<_, StockError>(())
            })
        };

        let backward = {
            let ledger = Arc::clone(&ledger);

            tokio::spawn(async move {
                for _ in 0..200 {
                    let reservation = ledger
                        .reserve_many(&[StockLine::new(b, 1), StockLine::new(a, 1)])
                        .await?;

                    ledger.release_many(reservation.lines()).await?;
                }

                Ok::<_, StockError>(())
            })
        };

        timeout(Duration::from_secs(10), forward).await???;
        timeout(Duration::from_secs(10), backward).await???;

        assert_eq!(ledger.level(a).await, Some(1_000));
        assert_eq!(ledger.level(b).await, Some(1_000));

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reservations_never_oversell() -> TestResult {
        let product = ProductUuid::new();
        let ledger = Arc::new(ledger_with(&[(product, 10)]).await);

        let mut tasks = Vec::new();

        for _ in 0..50 {
            let ledger = Arc::clone(&ledger);

            tasks.push(tokio::spawn(async move {
                ledger.reserve_many(&[StockLine::new(product, 1)]).await
            }));
        }

        let mut successes = 0;

        for task in tasks {
            if task.await?.is_ok() {
                successes += 1;
            }
        }

        assert_eq!(successes, 10);
        assert_eq!(ledger.level(product).await, Some(0));

        Ok(())
    }
}
