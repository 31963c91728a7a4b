//! # QuantStore Testkit
//!
//! Test utilities for QuantStore.
//!
//! This crate provides:
//! - Storage fixtures and table-driven sided rules
//! - A fault-injecting stack context for all-or-nothing conversion tests
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use quantstore_testkit::prelude::*;
//! use quantstore_core::{QuantityStorage, StorageLimits, TransactionManager};
//!
//! let tm = TransactionManager::new();
//! let tank = fixed_storage(StorageLimits::symmetric(100, 10), 5);
//!
//! let mut txn = tm.begin().unwrap();
//! assert_eq!(StorageOperation::Insert(30).apply(&tank, &mut txn), 10);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
