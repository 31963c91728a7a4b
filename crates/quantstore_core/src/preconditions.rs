//! Shared input validation.
//!
//! Quantities are `u64`, so a negative request cannot reach a storage
//! operation. Hosts holding signed values convert them here first; the
//! conversion fails loudly instead of clamping, since a negative request
//! is caller misuse rather than back-pressure.

use crate::error::{StorageError, StorageResult};

/// Converts a signed host amount into a quantity.
///
/// # Errors
///
/// Returns [`StorageError::NegativeAmount`] if `amount < 0`.
pub fn not_negative(amount: i64) -> StorageResult<u64> {
    u64::try_from(amount).map_err(|_| StorageError::negative_amount(amount))
}

/// Checks that an initial amount fits into a capacity.
///
/// # Errors
///
/// Returns [`StorageError::AmountExceedsCapacity`] if `amount > capacity`.
pub fn not_above(amount: u64, capacity: u64) -> StorageResult<u64> {
    if amount > capacity {
        return Err(StorageError::exceeds_capacity(amount, capacity));
    }
    Ok(amount)
}
