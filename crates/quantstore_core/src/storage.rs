//! Storage trait definition.

use quantstore_txn::Transaction;
use std::sync::Arc;

/// An object that stores a quantity of a fungible resource.
///
/// # Invariants
///
/// - `insert` and `extract` never move more than `max_amount`
/// - `insert` never pushes `amount` above `capacity`
/// - every mutation is reverted if `txn` or one of its ancestors aborts
/// - running out of room or rate returns less than requested, never an error
///
/// `amount` and `capacity` describe the current state. There is no guarantee
/// that the amount can be extracted, nor that anything can be inserted when
/// `capacity > amount`; simulate the operation to find out.
///
/// # Implementors
///
/// - [`super::FixedStorage`] - Fixed capacity and rates
/// - [`super::SideStorage`] - One face of a [`super::SidedContainer`]
/// - [`super::ItemBackedStorage`] - Amount spread over a unit stack
/// - [`super::DelegatingStorage`] - Validity guarded proxy
/// - [`super::EmptyStorage`] - Always empty
pub trait QuantityStorage: Send + Sync {
    /// Returns false if `insert` will always return 0, true otherwise or in
    /// doubt.
    ///
    /// Lets transfer devices skip peers that can never accept anything.
    fn supports_insertion(&self) -> bool {
        true
    }

    /// Inserts up to `max_amount`, returning the amount inserted.
    fn insert(&self, max_amount: u64, txn: &mut Transaction<'_>) -> u64;

    /// Returns false if `extract` will always return 0, true otherwise or in
    /// doubt.
    fn supports_extraction(&self) -> bool {
        true
    }

    /// Extracts up to `max_amount`, returning the amount extracted.
    fn extract(&self, max_amount: u64, txn: &mut Transaction<'_>) -> u64;

    /// Returns the amount currently stored.
    fn amount(&self) -> u64;

    /// Returns the maximum amount that could be stored.
    fn capacity(&self) -> u64;
}

impl<T: QuantityStorage + ?Sized> QuantityStorage for Arc<T> {
    fn supports_insertion(&self) -> bool {
        (**self).supports_insertion()
    }

    fn insert(&self, max_amount: u64, txn: &mut Transaction<'_>) -> u64 {
        (**self).insert(max_amount, txn)
    }

    fn supports_extraction(&self) -> bool {
        (**self).supports_extraction()
    }

    fn extract(&self, max_amount: u64, txn: &mut Transaction<'_>) -> u64 {
        (**self).extract(max_amount, txn)
    }

    fn amount(&self) -> u64 {
        (**self).amount()
    }

    fn capacity(&self) -> u64 {
        (**self).capacity()
    }
}

/// Returns how much `insert` would accept, without changing anything.
pub fn simulate_insert<S>(storage: &S, max_amount: u64, txn: &mut Transaction<'_>) -> u64
where
    S: QuantityStorage + ?Sized,
{
    let mut nested = txn.open_nested();
    let inserted = storage.insert(max_amount, &mut nested);
    nested.abort();
    inserted
}

/// Returns how much `extract` would release, without changing anything.
pub fn simulate_extract<S>(storage: &S, max_amount: u64, txn: &mut Transaction<'_>) -> u64
where
    S: QuantityStorage + ?Sized,
{
    let mut nested = txn.open_nested();
    let extracted = storage.extract(max_amount, &mut nested);
    nested.abort();
    extracted
}

/// A storage that is always empty and supports nothing.
///
/// Returned by lookups when nothing is registered.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EmptyStorage;

impl EmptyStorage {
    /// Returns a shared handle to an empty storage.
    #[must_use]
    pub fn shared() -> Arc<dyn QuantityStorage> {
        Arc::new(EmptyStorage)
    }
}

impl QuantityStorage for EmptyStorage {
    fn supports_insertion(&self) -> bool {
        false
    }

    fn insert(&self, _max_amount: u64, _txn: &mut Transaction<'_>) -> u64 {
        0
    }

    fn supports_extraction(&self) -> bool {
        false
    }

    fn extract(&self, _max_amount: u64, _txn: &mut Transaction<'_>) -> u64 {
        0
    }

    fn amount(&self) -> u64 {
        0
    }

    fn capacity(&self) -> u64 {
        0
    }
}
