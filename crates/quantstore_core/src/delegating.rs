//! Validity-guarded storage proxy.

use crate::item::StackContext;
use crate::storage::QuantityStorage;
use quantstore_txn::Transaction;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

type Supplier = Arc<dyn Fn() -> Arc<dyn QuantityStorage> + Send + Sync>;
type Predicate = Arc<dyn Fn() -> bool + Send + Sync>;

/// A storage that forwards every call to a backing storage while a validity
/// predicate holds.
///
/// The predicate is evaluated at the top of every call. While it is false,
/// the proxy behaves exactly like [`super::EmptyStorage`]: nothing is
/// supported, nothing moves, amount and capacity read 0. Stale handles
/// therefore degrade to "empty" instead of touching whatever now occupies
/// their referent.
///
/// The backing storage is re-resolved through the supplier on every call.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use quantstore_core::{DelegatingStorage, FixedStorage, QuantityStorage, StorageLimits};
///
/// let tank = Arc::new(FixedStorage::new(StorageLimits::symmetric(100, 10)));
/// let guarded = DelegatingStorage::new(tank, || false);
/// assert_eq!(guarded.capacity(), 0);
/// ```
#[derive(Clone)]
pub struct DelegatingStorage {
    supplier: Supplier,
    predicate: Predicate,
}

impl DelegatingStorage {
    /// Wraps a fixed backing storage behind `predicate`.
    pub fn new<P>(storage: Arc<dyn QuantityStorage>, predicate: P) -> Self
    where
        P: Fn() -> bool + Send + Sync + 'static,
    {
        Self::from_supplier(move || Arc::clone(&storage), predicate)
    }

    /// Wraps a backing storage resolved by `supplier` on every call.
    pub fn from_supplier<S, P>(supplier: S, predicate: P) -> Self
    where
        S: Fn() -> Arc<dyn QuantityStorage> + Send + Sync + 'static,
        P: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            supplier: Arc::new(supplier),
            predicate: Arc::new(predicate),
        }
    }

    /// Wraps `storage` with an always-true predicate.
    pub fn unguarded(storage: Arc<dyn QuantityStorage>) -> Self {
        Self::new(storage, || true)
    }

    /// Wraps `storage` so that it stays valid only while `ctx` holds a
    /// nonzero count of the item kind it held now.
    pub fn guard_stack(storage: Arc<dyn QuantityStorage>, ctx: Arc<dyn StackContext>) -> Self {
        let kind = ctx.variant().kind().clone();
        Self::new(storage, move || ctx.count() > 0 && ctx.variant().is_of(&kind))
    }

    /// Returns true if calls are currently forwarded.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (self.predicate)()
    }

    fn backing(&self, op: &'static str) -> Option<Arc<dyn QuantityStorage>> {
        if self.is_valid() {
            Some((self.supplier)())
        } else {
            trace!(op, "delegating storage rejected call");
            None
        }
    }
}

impl QuantityStorage for DelegatingStorage {
    fn supports_insertion(&self) -> bool {
        self.backing("supports_insertion")
            .is_some_and(|s| s.supports_insertion())
    }

    fn insert(&self, max_amount: u64, txn: &mut Transaction<'_>) -> u64 {
        self.backing("insert")
            .map_or(0, |s| s.insert(max_amount, txn))
    }

    fn supports_extraction(&self) -> bool {
        self.backing("supports_extraction")
            .is_some_and(|s| s.supports_extraction())
    }

    fn extract(&self, max_amount: u64, txn: &mut Transaction<'_>) -> u64 {
        self.backing("extract")
            .map_or(0, |s| s.extract(max_amount, txn))
    }

    fn amount(&self) -> u64 {
        self.backing("amount").map_or(0, |s| s.amount())
    }

    fn capacity(&self) -> u64 {
        self.backing("capacity").map_or(0, |s| s.capacity())
    }
}

impl fmt::Debug for DelegatingStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegatingStorage")
            .field("valid", &self.is_valid())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ItemBackedStorage, ItemVariant, SlotContext};
    use crate::{FixedStorage, StorageLimits};
    use quantstore_txn::TransactionManager;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn tank(amount: u64) -> Arc<FixedStorage> {
        Arc::new(FixedStorage::with_amount(StorageLimits::symmetric(100, 10), amount).unwrap())
    }

    #[test]
    fn false_predicate_is_inert() {
        let tm = TransactionManager::new();
        let backing = tank(50);
        let guarded = DelegatingStorage::new(backing.clone(), || false);

        let mut txn = tm.begin().unwrap();
        assert!(!guarded.supports_insertion());
        assert!(!guarded.supports_extraction());
        assert_eq!(guarded.insert(100, &mut txn), 0);
        assert_eq!(guarded.extract(100, &mut txn), 0);
        assert_eq!(guarded.amount(), 0);
        assert_eq!(guarded.capacity(), 0);
        txn.commit();

        assert_eq!(backing.amount(), 50);
    }

    #[test]
    fn true_predicate_forwards() {
        let tm = TransactionManager::new();
        let backing = tank(0);
        let guarded = DelegatingStorage::unguarded(backing.clone());

        let mut txn = tm.begin().unwrap();
        assert_eq!(guarded.insert(30, &mut txn), 10);
        txn.commit();

        assert_eq!(guarded.amount(), 10);
        assert_eq!(guarded.capacity(), 100);
        assert_eq!(backing.amount(), 10);
    }

    #[test]
    fn predicate_is_reevaluated_per_call() {
        let tm = TransactionManager::new();
        let valid = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&valid);
        let guarded = DelegatingStorage::new(tank(0), move || flag.load(Ordering::SeqCst));

        let mut txn = tm.begin().unwrap();
        assert_eq!(guarded.insert(5, &mut txn), 5);
        valid.store(false, Ordering::SeqCst);
        assert_eq!(guarded.insert(5, &mut txn), 0);
        assert_eq!(guarded.amount(), 0);
        valid.store(true, Ordering::SeqCst);
        assert_eq!(guarded.amount(), 5);
    }

    #[test]
    fn supplier_is_resolved_per_call() {
        let tm = TransactionManager::new();
        let first = tank(1);
        let second = tank(2);
        let use_second = Arc::new(AtomicBool::new(false));

        let switch = Arc::clone(&use_second);
        let (a, b) = (first.clone(), second.clone());
        let guarded = DelegatingStorage::from_supplier(
            move || -> Arc<dyn QuantityStorage> {
                if switch.load(Ordering::SeqCst) {
                    b.clone()
                } else {
                    a.clone()
                }
            },
            || true,
        );

        assert_eq!(guarded.amount(), 1);
        use_second.store(true, Ordering::SeqCst);
        assert_eq!(guarded.amount(), 2);

        let mut txn = tm.begin().unwrap();
        assert_eq!(guarded.extract(2, &mut txn), 2);
        txn.commit();
        assert_eq!(first.amount(), 1);
        assert_eq!(second.amount(), 0);
    }

    #[test]
    fn stack_guard_invalidates_on_kind_change() {
        let tm = TransactionManager::new();
        let slot = SlotContext::new(ItemVariant::of("battery").with_stored_amount(2), 2);
        let storage =
            ItemBackedStorage::create(Arc::new(slot.clone()), StorageLimits::symmetric(10, 10));
        assert_eq!(storage.amount(), 4);

        let mut txn = tm.begin().unwrap();
        let (variant, count) = slot.stack();
        assert_eq!(slot.extract(&variant, count, &mut txn), 2);
        assert!(!storage.is_valid());

        assert_eq!(slot.insert(&ItemVariant::of("cell"), 2, &mut txn), 2);
        assert!(!storage.is_valid());
        assert_eq!(storage.insert(10, &mut txn), 0);
        txn.abort();

        assert!(storage.is_valid());
        assert_eq!(storage.amount(), 4);
    }

    #[test]
    fn stack_guard_survives_amount_change() {
        let tm = TransactionManager::new();
        let slot = SlotContext::new(ItemVariant::of("battery"), 3);
        let storage =
            ItemBackedStorage::create(Arc::new(slot.clone()), StorageLimits::symmetric(10, 10));

        let mut txn = tm.begin().unwrap();
        assert_eq!(storage.insert(9, &mut txn), 9);
        assert_eq!(storage.insert(9, &mut txn), 9);
        txn.commit();

        assert_eq!(slot.stack(), (ItemVariant::of("battery").with_stored_amount(6), 3));
    }
}
