//! # QuantStore Core
//!
//! Transactional storages for a nonnegative quantity of a fungible resource.
//!
//! Every storage implements [`QuantityStorage`]: insertion and extraction
//! take part in a [`Transaction`] and are reverted if it aborts. Limits are
//! expressed as moved-amount back-pressure, never as errors.
//!
//! ## Available Storages
//!
//! - [`FixedStorage`] - Static capacity and per-operation limits
//! - [`SidedContainer`] - One shared amount behind seven face facades
//! - [`ItemBackedStorage`] - Amount distributed evenly over a unit stack
//! - [`ExtractOnlyItemStorage`] - Drain-only unit stack
//! - [`DelegatingStorage`] - Validity-guarded proxy for any storage
//! - [`EmptyStorage`] - Always empty
//!
//! ## Example
//!
//! ```rust
//! use quantstore_core::{FixedStorage, QuantityStorage, StorageLimits};
//! use quantstore_txn::TransactionManager;
//!
//! let tm = TransactionManager::new();
//! let tank = FixedStorage::new(StorageLimits::new(100, 10, 10));
//!
//! let mut txn = tm.begin().unwrap();
//! assert_eq!(tank.insert(30, &mut txn), 10);
//! txn.commit();
//! assert_eq!(tank.amount(), 10);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod delegating;
mod error;
mod fixed;
pub mod item;
mod lookup;
pub mod preconditions;
mod sided;
mod storage;

pub use config::StorageLimits;
pub use delegating::DelegatingStorage;
pub use error::{StorageError, StorageResult};
pub use fixed::{CommitHook, FixedStorage};
pub use item::{
    ExtractOnlyItemStorage, ItemBackedStorage, ItemKind, ItemVariant, SlotContext, StackContext,
    StorageItem, UnitData, STORED_AMOUNT_KEY,
};
pub use lookup::{BlockLookup, BlockPos, ItemLookup};
pub use sided::{Direction, Face, SideStorage, SidedContainer, SidedRules};
pub use storage::{simulate_extract, simulate_insert, EmptyStorage, QuantityStorage};

pub use quantstore_txn::{Transaction, TransactionManager, TransactionResult};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
