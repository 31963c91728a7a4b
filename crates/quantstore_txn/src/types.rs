//! Core type definitions for transactions.

use std::fmt;

/// Unique identifier for a root transaction.
///
/// Transaction IDs are monotonically increasing and unique within the process.
/// Nested transactions share the ID of their root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(pub u64);

impl TransactionId {
    /// Creates a new transaction ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn:{}", self.0)
    }
}

/// How a transaction was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionResult {
    /// Changes were kept.
    Committed,
    /// Changes were reverted.
    Aborted,
}

impl TransactionResult {
    /// Returns true if the transaction was committed.
    #[must_use]
    pub const fn was_committed(self) -> bool {
        matches!(self, Self::Committed)
    }

    /// Returns true if the transaction was aborted.
    #[must_use]
    pub const fn was_aborted(self) -> bool {
        matches!(self, Self::Aborted)
    }
}

impl fmt::Display for TransactionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Committed => f.write_str("committed"),
            Self::Aborted => f.write_str("aborted"),
        }
    }
}
