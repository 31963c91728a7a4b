//! Test fixtures: storage builders, sided rules, and fault-injecting
//! stack contexts.

use parking_lot::Mutex;
use quantstore_core::{
    Face, FixedStorage, ItemVariant, SidedRules, SlotContext, StackContext, StorageLimits,
    Transaction,
};
use std::sync::atomic::{AtomicU64, Ordering};

/// Returns a variant of `kind` holding `amount` per unit.
pub fn unit(kind: &str, amount: u64) -> ItemVariant {
    ItemVariant::of(kind).with_stored_amount(amount)
}

/// Creates a fixed storage holding `amount`.
///
/// # Panics
///
/// Panics if `amount` exceeds the capacity.
pub fn fixed_storage(limits: StorageLimits, amount: u64) -> FixedStorage {
    FixedStorage::with_amount(limits, amount).expect("initial amount exceeds capacity")
}

/// Sided rules backed by a per-face table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRules {
    capacity: u64,
    insert: [u64; Face::COUNT],
    extract: [u64; Face::COUNT],
}

impl TableRules {
    /// Creates rules with the same rates on every face.
    #[must_use]
    pub fn uniform(capacity: u64, rate: u64) -> Self {
        Self {
            capacity,
            insert: [rate; Face::COUNT],
            extract: [rate; Face::COUNT],
        }
    }

    /// Sets the insert rate of one face.
    #[must_use]
    pub fn with_insert(mut self, face: impl Into<Face>, rate: u64) -> Self {
        self.insert[face.into().index()] = rate;
        self
    }

    /// Sets the extract rate of one face.
    #[must_use]
    pub fn with_extract(mut self, face: impl Into<Face>, rate: u64) -> Self {
        self.extract[face.into().index()] = rate;
        self
    }
}

impl SidedRules for TableRules {
    fn capacity(&self) -> u64 {
        self.capacity
    }

    fn max_insert(&self, face: Face) -> u64 {
        self.insert[face.index()]
    }

    fn max_extract(&self, face: Face) -> u64 {
        self.extract[face.index()]
    }
}

/// A stack context over a [`SlotContext`] that can misbehave on demand.
///
/// - unit moves can be capped per call, so an exchange falls short
/// - the reported view can be frozen, so the context keeps announcing a
///   stack that the host has since changed
///
/// Faults never bypass transactions: every real move still goes through the
/// inner slot.
#[derive(Debug)]
pub struct FaultyContext {
    inner: SlotContext,
    extract_limit: AtomicU64,
    insert_limit: AtomicU64,
    frozen: Mutex<Option<(ItemVariant, u64)>>,
}

impl FaultyContext {
    /// Wraps `inner` without any fault enabled.
    #[must_use]
    pub fn new(inner: SlotContext) -> Self {
        Self {
            inner,
            extract_limit: AtomicU64::new(u64::MAX),
            insert_limit: AtomicU64::new(u64::MAX),
            frozen: Mutex::new(None),
        }
    }

    /// Returns the wrapped slot.
    #[must_use]
    pub fn inner(&self) -> &SlotContext {
        &self.inner
    }

    /// Caps the number of units a single extract moves.
    pub fn set_extract_limit(&self, limit: u64) {
        self.extract_limit.store(limit, Ordering::SeqCst);
    }

    /// Caps the number of units a single insert moves.
    pub fn set_insert_limit(&self, limit: u64) {
        self.insert_limit.store(limit, Ordering::SeqCst);
    }

    /// Keeps reporting the current variant and count until [`thaw`](Self::thaw).
    pub fn freeze(&self) {
        *self.frozen.lock() = Some(self.inner.stack());
    }

    /// Reports the live slot again.
    pub fn thaw(&self) {
        *self.frozen.lock() = None;
    }
}

impl StackContext for FaultyContext {
    fn variant(&self) -> ItemVariant {
        match self.frozen.lock().as_ref() {
            Some((variant, _)) => variant.clone(),
            None => self.inner.variant(),
        }
    }

    fn count(&self) -> u64 {
        match self.frozen.lock().as_ref() {
            Some((_, count)) => *count,
            None => self.inner.count(),
        }
    }

    fn insert(&self, variant: &ItemVariant, max_count: u64, txn: &mut Transaction<'_>) -> u64 {
        let limit = self.insert_limit.load(Ordering::SeqCst);
        self.inner.insert(variant, max_count.min(limit), txn)
    }

    fn extract(&self, variant: &ItemVariant, max_count: u64, txn: &mut Transaction<'_>) -> u64 {
        let limit = self.extract_limit.load(Ordering::SeqCst);
        self.inner.extract(variant, max_count.min(limit), txn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quantstore_core::{Direction, TransactionManager};

    #[test]
    fn table_rules_per_face() {
        let rules = TableRules::uniform(100, 10)
            .with_insert(Direction::Down, 0)
            .with_extract(Face::Any, 50);

        assert_eq!(rules.max_insert(Face::Side(Direction::Down)), 0);
        assert_eq!(rules.max_insert(Face::Any), 10);
        assert_eq!(rules.max_extract(Face::Any), 50);
        assert_eq!(rules.max_extract(Face::Side(Direction::Up)), 10);
    }

    #[test]
    fn frozen_view_outlives_host_change() {
        let tm = TransactionManager::new();
        let ctx = FaultyContext::new(SlotContext::new(unit("battery", 2), 4));
        ctx.freeze();

        let mut txn = tm.begin().unwrap();
        let (variant, count) = ctx.inner().stack();
        ctx.inner().extract(&variant, count, &mut txn);

        assert_eq!(ctx.count(), 4);
        assert_eq!(ctx.inner().count(), 0);
        ctx.thaw();
        assert_eq!(ctx.count(), 0);
    }

    #[test]
    fn extract_limit_caps_moves() {
        let tm = TransactionManager::new();
        let ctx = FaultyContext::new(SlotContext::new(unit("battery", 2), 4));
        ctx.set_extract_limit(3);

        let mut txn = tm.begin().unwrap();
        assert_eq!(ctx.extract(&unit("battery", 2), 4, &mut txn), 3);
        txn.abort();

        let mut txn = tm.begin().unwrap();
        assert!(!ctx.exchange(&unit("battery", 5), 4, &mut txn));
        assert_eq!(ctx.inner().stack(), (unit("battery", 2), 4));
    }
}
