//! Property tests for the storage laws.

use proptest::prelude::*;
use quantstore_core::{
    simulate_extract, simulate_insert, FixedStorage, ItemBackedStorage, QuantityStorage,
    SidedContainer, SlotContext, StackContext, StorageLimits, TransactionManager,
};
use quantstore_testkit::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

fn item_storage(limits: StorageLimits, per_unit: u64, count: u64) -> (SlotContext, ItemBackedStorage) {
    let slot = SlotContext::new(unit("cell", per_unit.min(limits.capacity)), count);
    let storage = ItemBackedStorage::new(Arc::new(slot.clone()), limits);
    (slot, storage)
}

proptest! {
    #![proptest_config(PropTestConfig::default().to_proptest_config())]

    #[test]
    fn fixed_respects_limits((limits, amount) in limits_with_amount_strategy(), x in 0u64..2_000) {
        let tm = TransactionManager::new();
        let tank = fixed_storage(limits, amount);
        let mut txn = tm.begin().unwrap();

        let inserted = tank.insert(x, &mut txn);
        prop_assert!(inserted <= x.min(limits.max_insert));
        prop_assert!(tank.amount() <= limits.capacity);
        prop_assert_eq!(tank.amount(), amount + inserted);

        let before = tank.amount();
        let extracted = tank.extract(x, &mut txn);
        prop_assert!(extracted <= x.min(limits.max_extract).min(before));
    }

    #[test]
    fn reads_are_idempotent((limits, amount) in limits_with_amount_strategy()) {
        let tank = fixed_storage(limits, amount);
        let first = (tank.amount(), tank.capacity());
        for _ in 0..3 {
            prop_assert_eq!((tank.amount(), tank.capacity()), first);
        }
    }

    #[test]
    fn simulation_matches_real_operation(
        (limits, amount) in limits_with_amount_strategy(),
        op in operation_strategy(),
    ) {
        let tm = TransactionManager::new();
        let tank = fixed_storage(limits, amount);
        let mut txn = tm.begin().unwrap();

        let simulated = match op {
            StorageOperation::Insert(x) => simulate_insert(&tank, x, &mut txn),
            StorageOperation::Extract(x) => simulate_extract(&tank, x, &mut txn),
        };
        prop_assert_eq!(tank.amount(), amount);
        prop_assert_eq!(op.apply(&tank, &mut txn), simulated);
    }

    #[test]
    fn fixed_rollback_law(
        (limits, amount) in limits_with_amount_strategy(),
        ops in operation_sequence_strategy(1, 20),
    ) {
        let tm = TransactionManager::new();
        let tank = fixed_storage(limits, amount);

        let mut txn = tm.begin().unwrap();
        for op in &ops {
            op.apply(&tank, &mut txn);
        }
        txn.abort();

        prop_assert_eq!(tank.amount(), amount);
    }

    #[test]
    fn sided_rollback_law(
        amount in 0u64..100,
        ops in operation_sequence_strategy(1, 20),
        face in 0usize..7,
    ) {
        let tm = TransactionManager::new();
        let rules = TableRules::uniform(100, 30).with_insert(quantstore_core::Face::Any, 60);
        let container = SidedContainer::with_amount(rules, amount).unwrap();
        let side = container.side_storage(quantstore_core::Face::from_index(face).unwrap());

        let mut txn = tm.begin().unwrap();
        for op in &ops {
            op.apply(&*side, &mut txn);
        }
        txn.abort();

        prop_assert_eq!(container.amount(), amount);
    }

    #[test]
    fn item_rollback_law(
        limits in limits_strategy(),
        per_unit in 0u64..1_000,
        count in 1u64..16,
        ops in operation_sequence_strategy(1, 20),
    ) {
        let tm = TransactionManager::new();
        let (slot, storage) = item_storage(limits, per_unit, count);
        let before = slot.stack();

        let mut txn = tm.begin().unwrap();
        for op in &ops {
            op.apply(&storage, &mut txn);
        }
        txn.abort();

        prop_assert_eq!(slot.stack(), before);
    }

    #[test]
    fn item_stack_stays_homogeneous(
        limits in limits_strategy(),
        per_unit in 0u64..1_000,
        count in 1u64..16,
        ops in operation_sequence_strategy(1, 20),
    ) {
        let tm = TransactionManager::new();
        let (slot, storage) = item_storage(limits, per_unit, count);

        let mut txn = tm.begin().unwrap();
        for op in &ops {
            let before = storage.amount();
            let moved = op.apply(&storage, &mut txn);
            prop_assert_eq!(moved % count, 0);
            prop_assert!(moved <= op.requested());

            let expected = match op {
                StorageOperation::Insert(_) => before + moved,
                StorageOperation::Extract(_) => before - moved,
            };
            prop_assert_eq!(storage.amount(), expected);
            prop_assert_eq!(slot.count(), count);
            prop_assert!(slot.variant().stored_amount() <= limits.capacity);
        }
        txn.commit();
    }

    #[test]
    fn nested_commit_law(
        (limits, amount) in limits_with_amount_strategy(),
        kept in operation_sequence_strategy(0, 8),
        dropped in operation_sequence_strategy(0, 8),
    ) {
        let tm = TransactionManager::new();
        let tank = fixed_storage(limits, amount);
        let mut root = tm.begin().unwrap();

        let mut child = root.open_nested();
        for op in &kept {
            op.apply(&tank, &mut child);
        }
        child.commit();
        let after_kept = tank.amount();

        let mut child = root.open_nested();
        for op in &dropped {
            op.apply(&tank, &mut child);
        }
        child.abort();
        prop_assert_eq!(tank.amount(), after_kept);

        // the parent is still usable
        let inserted = tank.insert(1, &mut root);
        prop_assert_eq!(tank.amount(), after_kept + inserted);
        root.commit();
        prop_assert_eq!(tank.amount(), after_kept + inserted);
    }

    #[test]
    fn final_commit_fires_once_on_net_change(
        (limits, amount) in limits_with_amount_strategy(),
        ops in operation_sequence_strategy(0, 20),
    ) {
        let tm = TransactionManager::new();
        let fired = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&fired);
        let tank = FixedStorage::with_amount(limits, amount)
            .unwrap()
            .on_commit(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        let mut txn = tm.begin().unwrap();
        for op in &ops {
            let mut nested = txn.open_nested();
            op.apply(&tank, &mut nested);
            nested.commit();
        }
        txn.commit();

        let changed = tank.amount() != amount;
        prop_assert_eq!(fired.load(Ordering::SeqCst), u32::from(changed));
    }
}

#[test]
fn aborted_root_never_fires_hook() {
    let tm = TransactionManager::new();
    let fired = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&fired);
    let tank = FixedStorage::new(StorageLimits::symmetric(10, 10)).on_commit(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let mut txn = tm.begin().unwrap();
    tank.insert(5, &mut txn);
    txn.abort();

    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[test]
fn second_root_is_refused_while_open() {
    let tm = TransactionManager::new();
    let txn = tm.begin().unwrap();

    assert!(tm.begin().is_err());
    drop(txn);
    assert!(tm.begin().is_ok());
}
