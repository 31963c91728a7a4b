//! Transaction manager.

use crate::error::{TxnError, TxnResult};
use crate::state::Transaction;
use crate::stats::TransactionStats;
use crate::types::TransactionId;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Next root transaction ID, shared by every manager in the process.
///
/// Participants key their snapshots by root ID, so IDs must never repeat
/// across managers.
static NEXT_TXID: AtomicU64 = AtomicU64::new(1);

/// Issues root transactions.
///
/// ## Single-Root Guarantee
///
/// Only one root transaction can be open at a time. [`begin`] acquires an
/// exclusive guard held for the root's lifetime and fails immediately with
/// [`TxnError::AlreadyOpen`] instead of waiting when another root is open.
///
/// [`begin`]: TransactionManager::begin
pub struct TransactionManager {
    /// Root lock - only one root at a time.
    root_lock: Mutex<()>,
    /// Counters shared with every transaction issued here.
    stats: Arc<TransactionStats>,
}

impl TransactionManager {
    /// Creates a new transaction manager.
    pub fn new() -> Self {
        Self {
            root_lock: Mutex::new(()),
            stats: Arc::new(TransactionStats::new()),
        }
    }

    /// Opens a root transaction.
    ///
    /// # Errors
    ///
    /// Returns [`TxnError::AlreadyOpen`] if a root transaction issued by
    /// this manager is still open.
    pub fn begin(&self) -> TxnResult<Transaction<'_>> {
        let guard = self.root_lock.try_lock().ok_or(TxnError::AlreadyOpen)?;
        let txid = TransactionId::new(NEXT_TXID.fetch_add(1, Ordering::Relaxed));
        self.stats.record_root_start();
        debug!(txn = %txid, "opened root transaction");

        Ok(Transaction::root(txid, guard, Arc::clone(&self.stats)))
    }

    /// Executes a function within a root transaction.
    ///
    /// If the function returns `Ok`, the transaction is committed.
    /// If it returns `Err`, the transaction is aborted.
    pub fn transaction<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<T, E>,
        E: From<TxnError>,
    {
        let mut txn = self.begin()?;
        match f(&mut txn) {
            Ok(value) => {
                txn.commit();
                Ok(value)
            }
            Err(err) => {
                txn.abort();
                Err(err)
            }
        }
    }

    /// Returns true while a root transaction is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.root_lock.is_locked()
    }

    /// Returns the transaction counters.
    #[must_use]
    pub fn stats(&self) -> &TransactionStats {
        &self.stats
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TransactionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionManager")
            .field("is_open", &self.is_open())
            .finish_non_exhaustive()
    }
}
