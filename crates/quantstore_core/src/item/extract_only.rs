//! Drain-only item-backed storage.

use super::context::StackContext;
use crate::delegating::DelegatingStorage;
use crate::storage::QuantityStorage;
use quantstore_txn::Transaction;
use std::fmt;
use std::sync::Arc;

/// An item-backed storage that can only be drained.
///
/// Insertion is always refused. Extraction has no rate limit but refuses any
/// request smaller than the stack count, and always converts the whole stack:
/// draining part of a stack never splits off a sub-stack.
pub struct ExtractOnlyItemStorage {
    ctx: Arc<dyn StackContext>,
    capacity: u64,
}

impl ExtractOnlyItemStorage {
    /// Creates an unguarded storage over `ctx` with a per-unit capacity.
    pub fn new(ctx: Arc<dyn StackContext>, capacity: u64) -> Self {
        Self { ctx, capacity }
    }

    /// Creates a storage over `ctx` behind a validity guard, see
    /// [`super::ItemBackedStorage::create`].
    pub fn create(ctx: Arc<dyn StackContext>, capacity: u64) -> DelegatingStorage {
        let storage: Arc<dyn QuantityStorage> = Arc::new(Self::new(Arc::clone(&ctx), capacity));
        DelegatingStorage::guard_stack(storage, ctx)
    }
}

impl QuantityStorage for ExtractOnlyItemStorage {
    fn supports_insertion(&self) -> bool {
        false
    }

    fn insert(&self, _max_amount: u64, _txn: &mut Transaction<'_>) -> u64 {
        0
    }

    fn extract(&self, max_amount: u64, txn: &mut Transaction<'_>) -> u64 {
        let count = self.ctx.count();
        if count == 0 || count > max_amount {
            return 0;
        }

        let variant = self.ctx.variant();
        let current = variant.stored_amount();
        let extracted_per_unit = (max_amount / count).min(current);
        if extracted_per_unit == 0 {
            return 0;
        }

        let drained = variant.with_stored_amount(current - extracted_per_unit);
        if self.ctx.exchange(&drained, count, txn) {
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
        self.ctx.count().saturating_mul(self.capacity)
    }
}

impl fmt::Debug for ExtractOnlyItemStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractOnlyItemStorage")
            .field("capacity", &self.capacity)
            .field("count", &self.ctx.count())
            .finish()
    }
}
