//! Stack context trait definition.

use super::variant::ItemVariant;
use quantstore_txn::Transaction;
use tracing::trace;

/// A slot holding `count` identical units of one variant.
///
/// Contexts are provided by the host. Item-backed storages never mutate the
/// variant in place: they exchange the whole stack for a new variant through
/// the transactional `extract`/`insert` pair.
pub trait StackContext: Send + Sync {
    /// Returns the variant currently in the slot.
    fn variant(&self) -> ItemVariant;

    /// Returns the number of units currently in the slot.
    fn count(&self) -> u64;

    /// Adds up to `max_count` units of `variant`, returning how many were added.
    fn insert(&self, variant: &ItemVariant, max_count: u64, txn: &mut Transaction<'_>) -> u64;

    /// Removes up to `max_count` units of `variant`, returning how many were
    /// removed.
    fn extract(&self, variant: &ItemVariant, max_count: u64, txn: &mut Transaction<'_>) -> u64;

    /// Replaces exactly `count` units of the current variant by `count` units
    /// of `new_variant`.
    ///
    /// All or nothing: if either move falls short, nothing changes and false
    /// is returned.
    fn exchange(&self, new_variant: &ItemVariant, count: u64, txn: &mut Transaction<'_>) -> bool {
        let old_variant = self.variant();
        let mut nested = txn.open_nested();

        if self.extract(&old_variant, count, &mut nested) == count
            && self.insert(new_variant, count, &mut nested) == count
        {
            nested.commit();
            return true;
        }

        trace!(from = %old_variant, to = %new_variant, count, "stack exchange failed");
        nested.abort();
        false
    }
}
