//! Item-backed storage with even per-unit distribution.

use super::context::StackContext;
use crate::config::StorageLimits;
use crate::delegating::DelegatingStorage;
use crate::storage::QuantityStorage;
use quantstore_txn::Transaction;
use std::fmt;
use std::sync::Arc;

/// A storage whose amount lives inside the units of a stack.
///
/// Every unit carries the same per-unit amount. An operation moves the same
/// delta into or out of each unit by exchanging the entire stack for a new
/// variant, so the moved total is always a multiple of the count. Requests
/// are rounded down: inserting 3 into a stack of 2 moves 0 or 2.
///
/// Limits apply per unit; totals scale with the count.
///
/// This type performs no context validation; use [`ItemBackedStorage::create`]
/// to get it behind a validity guard.
pub struct ItemBackedStorage {
    ctx: Arc<dyn StackContext>,
    limits: StorageLimits,
}

impl ItemBackedStorage {
    /// Creates an unguarded storage over `ctx`.
    pub fn new(ctx: Arc<dyn StackContext>, limits: StorageLimits) -> Self {
        Self { ctx, limits }
    }

    /// Creates a storage over `ctx` that turns inert as soon as the slot no
    /// longer holds the item kind it held at creation, or becomes empty.
    pub fn create(ctx: Arc<dyn StackContext>, limits: StorageLimits) -> DelegatingStorage {
        let storage: Arc<dyn QuantityStorage> = Arc::new(Self::new(Arc::clone(&ctx), limits));
        DelegatingStorage::guard_stack(storage, ctx)
    }

    /// Returns the per-unit limits.
    #[must_use]
    pub fn limits(&self) -> StorageLimits {
        self.limits
    }

    fn set_per_unit(&self, per_unit: u64, count: u64, txn: &mut Transaction<'_>) -> bool {
        let new_variant = self.ctx.variant().with_stored_amount(per_unit);
        self.ctx.exchange(&new_variant, count, txn)
    }
}

impl QuantityStorage for ItemBackedStorage {
    fn supports_insertion(&self) -> bool {
        self.limits.max_insert > 0
    }

    fn insert(&self, max_amount: u64, txn: &mut Transaction<'_>) -> u64 {
        let count = self.ctx.count();
        if count == 0 {
            return 0;
        }

        let current = self.ctx.variant().stored_amount();
        let inserted_per_unit = self
            .limits
            .max_insert
            .min(max_amount / count)
            .min(self.limits.capacity.saturating_sub(current));

        if inserted_per_unit > 0 && self.set_per_unit(current + inserted_per_unit, count, txn) {
            return inserted_per_unit * count;
        }
        0
    }

    fn supports_extraction(&self) -> bool {
        self.limits.max_extract > 0
    }

    fn extract(&self, max_amount: u64, txn: &mut Transaction<'_>) -> u64 {
        let count = self.ctx.count();
        if count == 0 {
            return 0;
        }

        let current = self.ctx.variant().stored_amount();
        let extracted_per_unit = self
            .limits
            .max_extract
            .min(max_amount / count)
            .min(current);

        if extracted_per_unit > 0 && self.set_per_unit(current - extracted_per_unit, count, txn) {
            return extracted_per_unit * count;
        }
        0
    }

    fn amount(&self) -> u64 {
        self.ctx
            .count()
            .saturating_mul(self.ctx.variant().stored_amount())
    }

    fn capacity(&self) -> u64 {
        self.ctx.count().saturating_mul(self.limits.capacity)
    }
}

impl fmt::Debug for ItemBackedStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemBackedStorage")
            .field("limits", &self.limits)
            .field("count", &self.ctx.count())
            .field("amount", &self.amount())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ItemVariant, SlotContext};
    use quantstore_txn::TransactionManager;

    fn battery(amount: u64) -> ItemVariant {
        ItemVariant::of("battery").with_stored_amount(amount)
    }

    fn setup(per_unit: u64, count: u64, limits: StorageLimits) -> (SlotContext, ItemBackedStorage) {
        let slot = SlotContext::new(battery(per_unit), count);
        let storage = ItemBackedStorage::new(Arc::new(slot.clone()), limits);
        (slot, storage)
    }

    #[test]
    fn insert_distributes_evenly() {
        let tm = TransactionManager::new();
        let (slot, storage) = setup(2, 4, StorageLimits::new(10, 3, 3));

        let mut txn = tm.begin().unwrap();
        assert_eq!(storage.insert(40, &mut txn), 12);
        txn.commit();

        assert_eq!(slot.stack(), (battery(5), 4));
        assert_eq!(storage.amount(), 20);
        assert_eq!(storage.capacity(), 40);
    }

    #[test]
    fn insert_rounds_down_to_multiple_of_count() {
        let tm = TransactionManager::new();
        let (_, storage) = setup(0, 2, StorageLimits::symmetric(10, 10));

        let mut txn = tm.begin().unwrap();
        assert_eq!(storage.insert(3, &mut txn), 2);
        assert_eq!(storage.insert(1, &mut txn), 0);
    }

    #[test]
    fn insert_respects_unit_capacity() {
        let tm = TransactionManager::new();
        let (slot, storage) = setup(9, 3, StorageLimits::symmetric(10, 10));

        let mut txn = tm.begin().unwrap();
        assert_eq!(storage.insert(100, &mut txn), 3);
        assert_eq!(storage.insert(100, &mut txn), 0);
        txn.commit();
        assert_eq!(slot.stack(), (battery(10), 3));
    }

    #[test]
    fn extract_to_zero_normalises_variant() {
        let tm = TransactionManager::new();
        let (slot, storage) = setup(4, 2, StorageLimits::symmetric(10, 10));

        let mut txn = tm.begin().unwrap();
        assert_eq!(storage.extract(100, &mut txn), 8);
        txn.commit();

        assert_eq!(slot.stack(), (ItemVariant::of("battery"), 2));
    }

    #[test]
    fn extract_limited_per_unit() {
        let tm = TransactionManager::new();
        let (slot, storage) = setup(8, 5, StorageLimits::new(10, 10, 2));

        let mut txn = tm.begin().unwrap();
        assert_eq!(storage.extract(100, &mut txn), 10);
        txn.commit();
        assert_eq!(slot.stack(), (battery(6), 5));
    }

    #[test]
    fn empty_slot_yields_zero() {
        let tm = TransactionManager::new();
        let slot = SlotContext::empty();
        let storage = ItemBackedStorage::new(Arc::new(slot), StorageLimits::symmetric(10, 10));

        let mut txn = tm.begin().unwrap();
        assert_eq!(storage.insert(100, &mut txn), 0);
        assert_eq!(storage.extract(100, &mut txn), 0);
        assert_eq!(storage.amount(), 0);
        assert_eq!(storage.capacity(), 0);
    }

    #[test]
    fn exactly_full_slot_still_converts() {
        let tm = TransactionManager::new();
        // old units leave the slot before the new ones arrive
        let slot = SlotContext::with_max_count(battery(1), 4, 4);
        let storage = ItemBackedStorage::new(Arc::new(slot.clone()), StorageLimits::symmetric(10, 10));

        let mut txn = tm.begin().unwrap();
        assert_eq!(storage.insert(8, &mut txn), 8);
        txn.commit();
        assert_eq!(slot.stack(), (battery(3), 4));
    }

    #[test]
    fn abort_restores_stack() {
        let tm = TransactionManager::new();
        let (slot, storage) = setup(2, 4, StorageLimits::symmetric(10, 10));

        let mut txn = tm.begin().unwrap();
        storage.insert(8, &mut txn);
        storage.extract(4, &mut txn);
        txn.abort();

        assert_eq!(slot.stack(), (battery(2), 4));
    }
}
