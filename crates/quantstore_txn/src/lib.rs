//! # QuantStore Transactions
//!
//! Nested transactions with snapshot-based rollback.
//!
//! This crate provides:
//! - [`TransactionManager`] issuing at most one root transaction at a time
//! - [`Transaction`] scopes that nest with strict stack discipline
//! - [`SnapshotParticipant`] and [`Participant`] for state that rolls back
//!   when a transaction (or any ancestor) aborts
//! - [`TransactionStats`] counters
//!
//! ## Example
//!
//! ```rust
//! use quantstore_txn::{Participant, SnapshotParticipant, TransactionManager};
//!
//! struct Counter(u64);
//!
//! impl SnapshotParticipant for Counter {
//!     type Snapshot = u64;
//!
//!     fn create_snapshot(&self) -> u64 {
//!         self.0
//!     }
//!
//!     fn read_snapshot(&mut self, snapshot: u64) {
//!         self.0 = snapshot;
//!     }
//! }
//!
//! let tm = TransactionManager::new();
//! let counter = Participant::new(Counter(0));
//!
//! let mut txn = tm.begin().unwrap();
//! counter.mutate(&mut txn, |c| c.0 += 5);
//! {
//!     let mut nested = txn.open_nested();
//!     counter.mutate(&mut nested, |c| c.0 += 1);
//!     // dropped without commit: aborted
//! }
//! assert_eq!(counter.read(|c| c.0), 5);
//! txn.abort();
//! assert_eq!(counter.read(|c| c.0), 0);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod manager;
mod participant;
mod state;
mod stats;
mod types;

pub use error::{TxnError, TxnResult};
pub use manager::TransactionManager;
pub use participant::{Participant, SnapshotParticipant};
pub use state::{Transaction, TransactionState};
pub use stats::{StatsSnapshot, TransactionStats};
pub use types::{TransactionId, TransactionResult};
