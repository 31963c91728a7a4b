//! Property-based test generators using proptest.
//!
//! Provides strategies for generating storage limits and operation
//! sequences that respect the storage invariants.

use proptest::prelude::*;
use quantstore_core::{QuantityStorage, StorageLimits, Transaction};

/// Strategy for generating storage limits.
///
/// Rates may be zero so that refusing storages are covered too.
pub fn limits_strategy() -> impl Strategy<Value = StorageLimits> {
    (0u64..1_000, 0u64..200, 0u64..200)
        .prop_map(|(capacity, max_insert, max_extract)| {
            StorageLimits::new(capacity, max_insert, max_extract)
        })
}

/// Strategy for generating limits together with a valid initial amount.
pub fn limits_with_amount_strategy() -> impl Strategy<Value = (StorageLimits, u64)> {
    limits_strategy().prop_flat_map(|limits| (Just(limits), 0..=limits.capacity))
}

/// A single storage operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOperation {
    /// Insert up to the amount.
    Insert(u64),
    /// Extract up to the amount.
    Extract(u64),
}

impl StorageOperation {
    /// Applies the operation, returning the amount moved.
    pub fn apply<S>(self, storage: &S, txn: &mut Transaction<'_>) -> u64
    where
        S: QuantityStorage + ?Sized,
    {
        match self {
            StorageOperation::Insert(amount) => storage.insert(amount, txn),
            StorageOperation::Extract(amount) => storage.extract(amount, txn),
        }
    }

    /// Returns the requested amount.
    #[must_use]
    pub fn requested(self) -> u64 {
        match self {
            StorageOperation::Insert(amount) | StorageOperation::Extract(amount) => amount,
        }
    }
}

/// Strategy for generating storage operations.
pub fn operation_strategy() -> impl Strategy<Value = StorageOperation> {
    prop_oneof![
        1 => (0u64..500).prop_map(StorageOperation::Insert),
        1 => (0u64..500).prop_map(StorageOperation::Extract),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<StorageOperation>> {
    prop::collection::vec(operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
