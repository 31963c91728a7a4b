//! Fixed-capacity storage.

use crate::config::StorageLimits;
use crate::error::StorageResult;
use crate::preconditions;
use crate::storage::QuantityStorage;
use quantstore_txn::{Participant, SnapshotParticipant, Transaction};
use std::fmt;

/// Hook invoked once per root commit that changed a storage.
///
/// Receives the committed amount. Typically marks the owner dirty or
/// notifies neighbours, which may read the storage again.
pub type CommitHook = Box<dyn FnMut(u64) + Send>;

struct AmountState {
    amount: u64,
}

impl SnapshotParticipant for AmountState {
    type Snapshot = u64;

    fn create_snapshot(&self) -> u64 {
        self.amount
    }

    fn read_snapshot(&mut self, snapshot: u64) {
        self.amount = snapshot;
    }
}

/// A storage with fixed capacity and fixed per-operation limits.
///
/// The amount is owned by the storage and rolls back with transactions.
/// Register a hook with [`on_commit`](FixedStorage::on_commit) to persist or
/// notify after a committed change.
pub struct FixedStorage {
    limits: StorageLimits,
    state: Participant<AmountState>,
}

impl FixedStorage {
    /// Creates an empty storage.
    #[must_use]
    pub fn new(limits: StorageLimits) -> Self {
        Self {
            limits,
            state: Participant::new(AmountState { amount: 0 }),
        }
    }

    /// Creates a storage holding `amount`, e.g. restored from saved state.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::AmountExceedsCapacity`] if the amount
    /// does not fit.
    pub fn with_amount(limits: StorageLimits, amount: u64) -> StorageResult<Self> {
        let amount = preconditions::not_above(amount, limits.capacity)?;
        Ok(Self {
            limits,
            state: Participant::new(AmountState { amount }),
        })
    }

    /// Installs the final-commit hook, replacing any previous one.
    #[must_use]
    pub fn on_commit<F>(self, hook: F) -> Self
    where
        F: FnMut(u64) + Send + 'static,
    {
        self.set_commit_hook(hook);
        self
    }

    /// Installs the final-commit hook on a shared storage.
    ///
    /// Pending snapshots are kept, so an open transaction still rolls back.
    pub fn set_commit_hook<F>(&self, hook: F)
    where
        F: FnMut(u64) + Send + 'static,
    {
        let mut hook: CommitHook = Box::new(hook);
        self.state.set_commit_hook(move |amount: &u64| hook(*amount));
    }

    /// Returns the configured limits.
    #[must_use]
    pub fn limits(&self) -> StorageLimits {
        self.limits
    }
}

impl QuantityStorage for FixedStorage {
    fn supports_insertion(&self) -> bool {
        self.limits.max_insert > 0
    }

    fn insert(&self, max_amount: u64, txn: &mut Transaction<'_>) -> u64 {
        let headroom = self.limits.capacity.saturating_sub(self.amount());
        let inserted = self.limits.max_insert.min(max_amount).min(headroom);

        if inserted > 0 {
            self.state.mutate(txn, |s| s.amount += inserted);
        }
        inserted
    }

    fn supports_extraction(&self) -> bool {
        self.limits.max_extract > 0
    }

    fn extract(&self, max_amount: u64, txn: &mut Transaction<'_>) -> u64 {
        let extracted = self.limits.max_extract.min(max_amount).min(self.amount());

        if extracted > 0 {
            self.state.mutate(txn, |s| s.amount -= extracted);
        }
        extracted
    }

    fn amount(&self) -> u64 {
        self.state.read(|s| s.amount)
    }

    fn capacity(&self) -> u64 {
        self.limits.capacity
    }
}

impl fmt::Debug for FixedStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedStorage")
            .field("limits", &self.limits)
            .field("amount", &self.amount())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use quantstore_txn::TransactionManager;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[test]
    fn insert_is_clamped_by_rate() {
        let tm = TransactionManager::new();
        let storage = FixedStorage::new(StorageLimits::new(100, 10, 10));

        let mut txn = tm.begin().unwrap();
        assert_eq!(storage.insert(30, &mut txn), 10);
        txn.commit();

        assert_eq!(storage.amount(), 10);
    }

    #[test]
    fn insert_is_clamped_by_headroom() {
        let tm = TransactionManager::new();
        let storage = FixedStorage::with_amount(StorageLimits::symmetric(100, 50), 95).unwrap();

        let mut txn = tm.begin().unwrap();
        assert_eq!(storage.insert(30, &mut txn), 5);
        assert_eq!(storage.insert(30, &mut txn), 0);
        txn.commit();
        assert_eq!(storage.amount(), 100);
    }

    #[test]
    fn extract_is_clamped_by_amount() {
        let tm = TransactionManager::new();
        let storage = FixedStorage::with_amount(StorageLimits::symmetric(100, 50), 7).unwrap();

        let mut txn = tm.begin().unwrap();
        assert_eq!(storage.extract(30, &mut txn), 7);
        assert_eq!(storage.extract(30, &mut txn), 0);
        txn.commit();
        assert_eq!(storage.amount(), 0);
    }

    #[test]
    fn repeated_inserts_roll_back() {
        let tm = TransactionManager::new();
        let storage = FixedStorage::new(StorageLimits::new(100, 10, 10));

        let mut txn = tm.begin().unwrap();
        for _ in 0..5 {
            assert_eq!(storage.insert(5, &mut txn), 5);
        }
        assert_eq!(storage.amount(), 25);
        txn.abort();

        assert_eq!(storage.amount(), 0);
        assert_eq!(tm.stats().snapshots_taken(), 1);
    }

    #[test]
    fn support_flags_follow_rates() {
        let storage = FixedStorage::new(StorageLimits::new(100, 0, 10));
        assert!(!storage.supports_insertion());
        assert!(storage.supports_extraction());
    }

    #[test]
    fn with_amount_rejects_overfull() {
        assert!(FixedStorage::with_amount(StorageLimits::symmetric(5, 5), 6).is_err());
    }

    #[test]
    fn commit_hook_receives_committed_amount() {
        let tm = TransactionManager::new();
        let seen = Arc::new(AtomicU64::new(0));
        let hook_seen = Arc::clone(&seen);
        let storage = FixedStorage::new(StorageLimits::symmetric(100, 100))
            .on_commit(move |amount| hook_seen.store(amount, Ordering::SeqCst));

        let mut txn = tm.begin().unwrap();
        storage.insert(40, &mut txn);
        txn.abort();
        assert_eq!(seen.load(Ordering::SeqCst), 0);

        let mut txn = tm.begin().unwrap();
        storage.insert(40, &mut txn);
        storage.extract(15, &mut txn);
        txn.commit();
        assert_eq!(seen.load(Ordering::SeqCst), 25);
        assert_eq!(tm.stats().final_commits(), 1);
    }

    #[test]
    fn commit_hook_may_read_storage() {
        let tm = TransactionManager::new();
        let seen = Arc::new(AtomicU64::new(0));
        let storage = Arc::new(FixedStorage::new(StorageLimits::symmetric(100, 100)));
        let neighbour = Arc::clone(&storage);
        let hook_seen = Arc::clone(&seen);
        storage.set_commit_hook(move |_| hook_seen.store(neighbour.amount(), Ordering::SeqCst));

        let mut txn = tm.begin().unwrap();
        storage.insert(5, &mut txn);
        txn.commit();

        assert_eq!(seen.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn hook_installed_mid_transaction_keeps_rollback() {
        let tm = TransactionManager::new();
        let seen = Arc::new(AtomicU64::new(0));
        let hook_seen = Arc::clone(&seen);
        let storage = FixedStorage::with_amount(StorageLimits::symmetric(100, 100), 20).unwrap();

        let mut txn = tm.begin().unwrap();
        storage.insert(30, &mut txn);
        let storage = storage.on_commit(move |amount| hook_seen.store(amount, Ordering::SeqCst));
        txn.abort();

        assert_eq!(storage.amount(), 20);
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }

    proptest! {
        #[test]
        fn operations_respect_limits(
            capacity in 0u64..1000,
            max_insert in 0u64..200,
            max_extract in 0u64..200,
            fill in 0u64..1000,
            request in 0u64..2000,
        ) {
            let amount = fill.min(capacity);
            let tm = TransactionManager::new();
            let storage = FixedStorage::with_amount(
                StorageLimits::new(capacity, max_insert, max_extract),
                amount,
            ).unwrap();

            let mut txn = tm.begin().unwrap();
            let inserted = storage.insert(request, &mut txn);
            prop_assert!(inserted <= request.min(max_insert));
            prop_assert!(storage.amount() <= capacity);
            prop_assert_eq!(storage.amount(), amount + inserted);

            let before = storage.amount();
            let extracted = storage.extract(request, &mut txn);
            prop_assert!(extracted <= request.min(max_extract).min(before));
            txn.abort();

            prop_assert_eq!(storage.amount(), amount);
            prop_assert_eq!(storage.capacity(), capacity);
        }
    }
}
