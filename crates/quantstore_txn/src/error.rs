//! Error types for transaction management.

use thiserror::Error;

/// Result type for transaction operations.
pub type TxnResult<T> = Result<T, TxnError>;

/// Errors that can occur when opening transactions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxnError {
    /// A root transaction is already open on this manager.
    #[error("a root transaction is already open")]
    AlreadyOpen,
}
