//! Item types that embed a stored amount in their units.

use super::context::StackContext;
use super::simple::ItemBackedStorage;
use super::variant::ItemVariant;
use crate::config::StorageLimits;
use crate::delegating::DelegatingStorage;
use crate::error::{StorageError, StorageResult};
use std::sync::Arc;

/// An item type whose units each hold an amount.
///
/// Implementing this trait is enough to get a storage for any stack of the
/// item: register it with [`crate::ItemLookup::register_storage_item`]. All
/// limits are per unit and ignore the stack count.
pub trait StorageItem: Send + Sync {
    /// Maximum amount one unit of `variant` can hold.
    fn unit_capacity(&self, variant: &ItemVariant) -> u64;

    /// Maximum amount one unit accepts in a single operation.
    fn max_unit_input(&self, variant: &ItemVariant) -> u64;

    /// Maximum amount one unit releases in a single operation.
    fn max_unit_output(&self, variant: &ItemVariant) -> u64;

    /// Returns the amount stored in one unit. Count is ignored.
    fn stored_amount(&self, variant: &ItemVariant) -> u64 {
        variant.stored_amount()
    }

    /// Sets the amount stored in one unit. Count is ignored.
    ///
    /// Callers keep `amount` within [`unit_capacity`](Self::unit_capacity).
    fn set_stored_amount(&self, variant: &mut ItemVariant, amount: u64) {
        variant.set_stored_amount(amount);
    }

    /// Uses exactly `amount` from a single unit outside of any transaction.
    ///
    /// Returns `Ok(false)` and leaves `variant` untouched if not enough is
    /// stored.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidCount`] unless `count` is exactly 1.
    fn try_use_amount(
        &self,
        variant: &mut ItemVariant,
        count: u64,
        amount: u64,
    ) -> StorageResult<bool> {
        if count != 1 {
            return Err(StorageError::invalid_count(count));
        }

        match self.stored_amount(variant).checked_sub(amount) {
            Some(remaining) => {
                self.set_stored_amount(variant, remaining);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Returns the per-unit limits of `variant`.
    fn limits(&self, variant: &ItemVariant) -> StorageLimits {
        StorageLimits::new(
            self.unit_capacity(variant),
            self.max_unit_input(variant),
            self.max_unit_output(variant),
        )
    }

    /// Creates a guarded storage over the stack in `ctx`.
    fn create_storage(&self, ctx: Arc<dyn StackContext>) -> DelegatingStorage {
        let limits = self.limits(&ctx.variant());
        ItemBackedStorage::create(ctx, limits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::SlotContext;
    use crate::storage::QuantityStorage;
    use quantstore_txn::TransactionManager;

    struct Battery;

    impl StorageItem for Battery {
        fn unit_capacity(&self, _variant: &ItemVariant) -> u64 {
            100
        }

        fn max_unit_input(&self, _variant: &ItemVariant) -> u64 {
            25
        }

        fn max_unit_output(&self, _variant: &ItemVariant) -> u64 {
            50
        }
    }

    #[test]
    fn try_use_amount_spends_exactly() {
        let mut variant = ItemVariant::of("battery").with_stored_amount(30);

        assert!(Battery.try_use_amount(&mut variant, 1, 30).unwrap());
        assert_eq!(variant, ItemVariant::of("battery"));
    }

    #[test]
    fn try_use_amount_refuses_overdraw() {
        let mut variant = ItemVariant::of("battery").with_stored_amount(10);

        assert!(!Battery.try_use_amount(&mut variant, 1, 11).unwrap());
        assert_eq!(variant.stored_amount(), 10);
    }

    #[test]
    fn try_use_amount_requires_single_unit() {
        let mut variant = ItemVariant::of("battery").with_stored_amount(10);

        let err = Battery.try_use_amount(&mut variant, 2, 1).unwrap_err();
        assert_eq!(err, StorageError::InvalidCount { count: 2 });
        assert_eq!(variant.stored_amount(), 10);
    }

    #[test]
    fn created_storage_uses_item_limits() {
        let tm = TransactionManager::new();
        let slot = SlotContext::new(ItemVariant::of("battery"), 2);
        let storage = Battery.create_storage(Arc::new(slot.clone()));

        assert_eq!(storage.capacity(), 200);

        let mut txn = tm.begin().unwrap();
        assert_eq!(storage.insert(1000, &mut txn), 50);
        txn.commit();

        assert_eq!(slot.variant().stored_amount(), 25);
    }
}
