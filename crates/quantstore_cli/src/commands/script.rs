//! Operation script format.
//!
//! A script declares one storage and a list of root transactions:
//!
//! ```json
//! {
//!   "storage": { "kind": "fixed", "limits": { "capacity": 100, "max_insert": 10 } },
//!   "transactions": [
//!     { "steps": [ { "op": "insert", "amount": 30 } ] },
//!     { "steps": [ { "op": "extract", "amount": 5 } ], "outcome": "abort" }
//!   ]
//! }
//! ```

use quantstore_core::{
    preconditions, Direction, ExtractOnlyItemStorage, Face, FixedStorage, ItemBackedStorage,
    ItemVariant, QuantityStorage, SidedContainer, SidedRules, SlotContext, StorageError,
    StorageLimits,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while loading or running a script.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The script file could not be read.
    #[error("failed to read script: {0}")]
    Io(#[from] std::io::Error),

    /// The script is not valid JSON for this format.
    #[error("invalid script: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value in the script violates a storage precondition.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A complete script.
#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    /// The storage to drive.
    pub storage: StorageSpec,
    /// Root transactions, run in order.
    #[serde(default)]
    pub transactions: Vec<TransactionSpec>,
}

impl Script {
    /// Parses a script from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ScriptError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// How a transaction closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Keep the changes.
    #[default]
    Commit,
    /// Revert the changes.
    Abort,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Commit => write!(f, "commit"),
            Outcome::Abort => write!(f, "abort"),
        }
    }
}

/// One root transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionSpec {
    /// Steps run inside the transaction.
    #[serde(default)]
    pub steps: Vec<Step>,
    /// How the transaction closes.
    #[serde(default)]
    pub outcome: Outcome,
}

/// A face name as written in scripts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceKey {
    /// Below.
    Down,
    /// Above.
    Up,
    /// North side.
    North,
    /// South side.
    South,
    /// West side.
    West,
    /// East side.
    East,
    /// No particular side.
    #[default]
    Any,
}

impl FaceKey {
    /// Returns the name used in scripts.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FaceKey::Down => "down",
            FaceKey::Up => "up",
            FaceKey::North => "north",
            FaceKey::South => "south",
            FaceKey::West => "west",
            FaceKey::East => "east",
            FaceKey::Any => "any",
        }
    }
}

impl From<FaceKey> for Face {
    fn from(key: FaceKey) -> Self {
        match key {
            FaceKey::Down => Face::Side(Direction::Down),
            FaceKey::Up => Face::Side(Direction::Up),
            FaceKey::North => Face::Side(Direction::North),
            FaceKey::South => Face::Side(Direction::South),
            FaceKey::West => Face::Side(Direction::West),
            FaceKey::East => Face::Side(Direction::East),
            FaceKey::Any => Face::Any,
        }
    }
}

/// A single script step.
///
/// Amounts are signed so that negative requests reach the precondition
/// check instead of failing to parse.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Insert up to `amount` through `face`.
    Insert {
        /// Requested amount.
        amount: i64,
        /// Access face.
        #[serde(default)]
        face: FaceKey,
    },
    /// Extract up to `amount` through `face`.
    Extract {
        /// Requested amount.
        amount: i64,
        /// Access face.
        #[serde(default)]
        face: FaceKey,
    },
    /// Report what an insert would move, without moving anything.
    SimulateInsert {
        /// Requested amount.
        amount: i64,
        /// Access face.
        #[serde(default)]
        face: FaceKey,
    },
    /// Report what an extract would move, without moving anything.
    SimulateExtract {
        /// Requested amount.
        amount: i64,
        /// Access face.
        #[serde(default)]
        face: FaceKey,
    },
    /// Run steps in a nested transaction.
    Nested {
        /// Steps run inside the nested transaction.
        #[serde(default)]
        steps: Vec<Step>,
        /// How the nested transaction closes.
        #[serde(default)]
        outcome: Outcome,
    },
}

/// Per-face rate table of a sided storage.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FaceRates {
    /// Rate of faces not listed in `faces`.
    #[serde(default)]
    pub default: u64,
    /// Per-face overrides.
    #[serde(default)]
    pub faces: BTreeMap<FaceKey, u64>,
}

impl FaceRates {
    fn rate(&self, face: Face) -> u64 {
        self.faces
            .iter()
            .find(|(key, _)| Face::from(**key) == face)
            .map_or(self.default, |(_, rate)| *rate)
    }
}

/// Sided rules declared in a script.
#[derive(Debug, Clone)]
pub struct ScriptedRules {
    capacity: u64,
    insert: FaceRates,
    extract: FaceRates,
}

impl SidedRules for ScriptedRules {
    fn capacity(&self) -> u64 {
        self.capacity
    }

    fn max_insert(&self, face: Face) -> u64 {
        self.insert.rate(face)
    }

    fn max_extract(&self, face: Face) -> u64 {
        self.extract.rate(face)
    }
}

/// The storage a script drives.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorageSpec {
    /// A [`FixedStorage`].
    Fixed {
        /// Capacity and rates.
        limits: StorageLimits,
        /// Initial amount.
        #[serde(default)]
        amount: i64,
    },
    /// A [`SidedContainer`] with per-face rates.
    Sided {
        /// Capacity.
        capacity: u64,
        /// Initial amount.
        #[serde(default)]
        amount: i64,
        /// Insert rates.
        #[serde(default)]
        insert: FaceRates,
        /// Extract rates.
        #[serde(default)]
        extract: FaceRates,
    },
    /// An [`ItemBackedStorage`] over an in-memory slot.
    Item {
        /// Item kind of the stack.
        item: String,
        /// Amount stored in each unit.
        #[serde(default)]
        per_unit: u64,
        /// Number of units.
        count: u64,
        /// Per-unit capacity and rates.
        limits: StorageLimits,
    },
    /// An [`ExtractOnlyItemStorage`] over an in-memory slot.
    ExtractOnly {
        /// Item kind of the stack.
        item: String,
        /// Amount stored in each unit.
        #[serde(default)]
        per_unit: u64,
        /// Number of units.
        count: u64,
        /// Per-unit capacity.
        capacity: u64,
    },
}

impl StorageSpec {
    /// Returns the storage kind as written in scripts.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            StorageSpec::Fixed { .. } => "fixed",
            StorageSpec::Sided { .. } => "sided",
            StorageSpec::Item { .. } => "item",
            StorageSpec::ExtractOnly { .. } => "extract_only",
        }
    }

    /// Builds the storage.
    ///
    /// # Errors
    ///
    /// Fails if an initial amount is negative or exceeds the capacity.
    pub fn build(&self) -> Result<Target, ScriptError> {
        let target = match self {
            StorageSpec::Fixed { limits, amount } => {
                let amount = preconditions::not_negative(*amount)?;
                let storage = FixedStorage::with_amount(*limits, amount)?;
                Target::Single(Arc::new(storage))
            }
            StorageSpec::Sided {
                capacity,
                amount,
                insert,
                extract,
            } => {
                let amount = preconditions::not_negative(*amount)?;
                let rules = ScriptedRules {
                    capacity: *capacity,
                    insert: insert.clone(),
                    extract: extract.clone(),
                };
                Target::Sided(SidedContainer::with_amount(rules, amount)?)
            }
            StorageSpec::Item {
                item,
                per_unit,
                count,
                limits,
            } => {
                preconditions::not_above(*per_unit, limits.capacity)?;
                let slot = slot(item, *per_unit, *count);
                Target::Single(Arc::new(ItemBackedStorage::create(Arc::new(slot), *limits)))
            }
            StorageSpec::ExtractOnly {
                item,
                per_unit,
                count,
                capacity,
            } => {
                preconditions::not_above(*per_unit, *capacity)?;
                let slot = slot(item, *per_unit, *count);
                Target::Single(Arc::new(ExtractOnlyItemStorage::create(
                    Arc::new(slot),
                    *capacity,
                )))
            }
        };
        Ok(target)
    }
}

fn slot(item: &str, per_unit: u64, count: u64) -> SlotContext {
    SlotContext::new(ItemVariant::of(item).with_stored_amount(per_unit), count)
}

/// A built storage, addressable by face.
pub enum Target {
    /// A storage that looks the same from every face.
    Single(Arc<dyn QuantityStorage>),
    /// A sided container.
    Sided(SidedContainer<ScriptedRules>),
}

impl Target {
    /// Returns the storage seen through `face`.
    pub fn storage(&self, face: FaceKey) -> Arc<dyn QuantityStorage> {
        match self {
            Target::Single(storage) => Arc::clone(storage),
            Target::Sided(container) => container.side_storage(face),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_script() {
        let script = Script::from_json(
            r#"{ "storage": { "kind": "fixed", "limits": { "capacity": 100 } } }"#,
        )
        .unwrap();

        assert!(script.transactions.is_empty());
        let target = script.storage.build().unwrap();
        let storage = target.storage(FaceKey::Any);
        assert_eq!(storage.capacity(), 100);
    }

    #[test]
    fn parses_steps_with_defaults() {
        let script = Script::from_json(
            r#"{
                "storage": { "kind": "sided", "capacity": 50, "insert": { "default": 5, "faces": { "down": 0 } } },
                "transactions": [
                    { "steps": [
                        { "op": "insert", "amount": 10, "face": "down" },
                        { "op": "nested", "steps": [ { "op": "extract", "amount": 1 } ], "outcome": "abort" }
                    ] }
                ]
            }"#,
        )
        .unwrap();

        let txn = &script.transactions[0];
        assert_eq!(txn.outcome, Outcome::Commit);
        assert!(matches!(
            txn.steps[0],
            Step::Insert { amount: 10, face: FaceKey::Down }
        ));
        assert!(matches!(
            &txn.steps[1],
            Step::Nested { outcome: Outcome::Abort, steps } if steps.len() == 1
        ));
    }

    #[test]
    fn scripted_rules_use_overrides() {
        let mut faces = BTreeMap::new();
        faces.insert(FaceKey::Down, 0);
        let rates = FaceRates { default: 7, faces };

        assert_eq!(rates.rate(Face::Side(Direction::Down)), 0);
        assert_eq!(rates.rate(Face::Any), 7);
    }

    #[test]
    fn negative_initial_amount_is_rejected() {
        let script = Script::from_json(
            r#"{ "storage": { "kind": "fixed", "limits": { "capacity": 10 }, "amount": -1 } }"#,
        )
        .unwrap();

        assert!(matches!(
            script.storage.build(),
            Err(ScriptError::Storage(StorageError::NegativeAmount { amount: -1 }))
        ));
    }

    #[test]
    fn oversized_unit_amount_is_rejected() {
        let script = Script::from_json(
            r#"{ "storage": { "kind": "item", "item": "cell", "per_unit": 11, "count": 2, "limits": { "capacity": 10 } } }"#,
        )
        .unwrap();

        assert!(script.storage.build().is_err());
    }
}
