//! Storage configuration.

use crate::error::StorageResult;
use crate::preconditions;
use serde::{Deserialize, Serialize};

/// Capacity and per-operation limits of a storage.
///
/// For item-backed storages the values apply to a single unit; totals scale
/// with the stack count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageLimits {
    /// Maximum amount that can be stored.
    pub capacity: u64,

    /// Maximum amount accepted by a single insert.
    #[serde(default = "unlimited")]
    pub max_insert: u64,

    /// Maximum amount released by a single extract.
    #[serde(default = "unlimited")]
    pub max_extract: u64,
}

fn unlimited() -> u64 {
    u64::MAX
}

impl Default for StorageLimits {
    fn default() -> Self {
        Self {
            capacity: 0,
            max_insert: u64::MAX,
            max_extract: u64::MAX,
        }
    }
}

impl StorageLimits {
    /// Creates limits from explicit values.
    #[must_use]
    pub const fn new(capacity: u64, max_insert: u64, max_extract: u64) -> Self {
        Self {
            capacity,
            max_insert,
            max_extract,
        }
    }

    /// Creates limits with the same insert and extract rate.
    #[must_use]
    pub const fn symmetric(capacity: u64, rate: u64) -> Self {
        Self::new(capacity, rate, rate)
    }

    /// Creates limits from signed host values.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::NegativeAmount`] for any negative value.
    pub fn from_signed(capacity: i64, max_insert: i64, max_extract: i64) -> StorageResult<Self> {
        Ok(Self::new(
            preconditions::not_negative(capacity)?,
            preconditions::not_negative(max_insert)?,
            preconditions::not_negative(max_extract)?,
        ))
    }

    /// Sets the capacity.
    #[must_use]
    pub const fn with_capacity(mut self, capacity: u64) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the per-operation insert limit.
    #[must_use]
    pub const fn with_max_insert(mut self, max_insert: u64) -> Self {
        self.max_insert = max_insert;
        self
    }

    /// Sets the per-operation extract limit.
    #[must_use]
    pub const fn with_max_extract(mut self, max_extract: u64) -> Self {
        self.max_extract = max_extract;
        self
    }
}
