//! Unit variants and their embedded per-unit amount.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Key under which the per-unit stored amount lives in [`UnitData`].
pub const STORED_AMOUNT_KEY: &str = "stored_amount";

/// Identifier of an item type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemKind(String);

impl ItemKind {
    /// Creates an item kind.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for the kind of an empty slot.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ItemKind {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Persisted data carried by every unit of a variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitData(BTreeMap<String, u64>);

impl UnitData {
    /// Creates empty unit data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<u64> {
        self.0.get(key).copied()
    }

    /// Stores `value` under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: u64) {
        self.0.insert(key.into(), value);
    }

    /// Removes the value stored under `key`.
    pub fn remove(&mut self, key: &str) -> Option<u64> {
        self.0.remove(key)
    }

    /// Returns true if no values are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The shared identity of a stack of units: item kind plus unit data.
///
/// Two units stack only if their variants are equal. Data is normalised so
/// that a unit emptied to zero compares equal to a freshly created one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemVariant {
    kind: ItemKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<UnitData>,
}

impl ItemVariant {
    /// Creates a variant without data.
    pub fn of(kind: impl Into<ItemKind>) -> Self {
        Self {
            kind: kind.into(),
            data: None,
        }
    }

    /// Creates a variant with the given data. Empty data is dropped.
    pub fn with_data(kind: impl Into<ItemKind>, data: UnitData) -> Self {
        Self {
            kind: kind.into(),
            data: (!data.is_empty()).then_some(data),
        }
    }

    /// Returns the variant of an empty slot.
    #[must_use]
    pub fn blank() -> Self {
        Self::of(ItemKind::new(""))
    }

    /// Returns true for the variant of an empty slot.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.kind.is_empty()
    }

    /// Returns the item kind.
    #[must_use]
    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    /// Returns true if this variant is of the given kind, ignoring data.
    #[must_use]
    pub fn is_of(&self, kind: &ItemKind) -> bool {
        &self.kind == kind
    }

    /// Returns the unit data, if any.
    #[must_use]
    pub fn data(&self) -> Option<&UnitData> {
        self.data.as_ref()
    }

    /// Returns the amount stored in one unit, 0 if absent.
    #[must_use]
    pub fn stored_amount(&self) -> u64 {
        self.data
            .as_ref()
            .and_then(|data| data.get(STORED_AMOUNT_KEY))
            .unwrap_or(0)
    }

    /// Sets the amount stored in one unit.
    ///
    /// Zero removes the field entirely, dropping the data once it is empty,
    /// so emptied units keep stacking with new ones.
    pub fn set_stored_amount(&mut self, amount: u64) {
        if amount == 0 {
            if let Some(data) = self.data.as_mut() {
                data.remove(STORED_AMOUNT_KEY);
                if data.is_empty() {
                    self.data = None;
                }
            }
        } else {
            self.data
                .get_or_insert_with(UnitData::new)
                .insert(STORED_AMOUNT_KEY, amount);
        }
    }

    /// Returns a copy of this variant carrying `amount` per unit.
    #[must_use]
    pub fn with_stored_amount(&self, amount: u64) -> Self {
        let mut variant = self.clone();
        variant.set_stored_amount(amount);
        variant
    }
}

impl fmt::Display for ItemVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stored_amount() {
            0 => write!(f, "{}", self.kind),
            amount => write!(f, "{}[{}]", self.kind, amount),
        }
    }
}
