//! Error types for storage operations.

use quantstore_txn::TxnError;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur when building or driving storages.
///
/// Running out of capacity or rate is not an error: operations simply move
/// less than requested. These variants cover caller misuse only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// A negative amount was supplied where a quantity was expected.
    #[error("amount must not be negative: {amount}")]
    NegativeAmount {
        /// The rejected value.
        amount: i64,
    },

    /// An initial amount does not fit into the declared capacity.
    #[error("amount {amount} exceeds capacity {capacity}")]
    AmountExceedsCapacity {
        /// The rejected amount.
        amount: u64,
        /// The declared capacity.
        capacity: u64,
    },

    /// An operation required a stack of exactly one unit.
    #[error("invalid stack count: expected exactly 1, got {count}")]
    InvalidCount {
        /// The count that was found.
        count: u64,
    },

    /// A transaction could not be opened.
    #[error("transaction error: {0}")]
    Txn(#[from] TxnError),
}

impl StorageError {
    /// Creates a negative amount error.
    pub fn negative_amount(amount: i64) -> Self {
        Self::NegativeAmount { amount }
    }

    /// Creates an amount exceeds capacity error.
    pub fn exceeds_capacity(amount: u64, capacity: u64) -> Self {
        Self::AmountExceedsCapacity { amount, capacity }
    }

    /// Creates an invalid count error.
    pub fn invalid_count(count: u64) -> Self {
        Self::InvalidCount { count }
    }
}
