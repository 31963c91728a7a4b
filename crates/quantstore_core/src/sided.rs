//! Multi-sided storage.
//!
//! A [`SidedContainer`] owns a single amount and hands out one
//! [`SideStorage`] facade per [`Face`]. Facades hold no state of their own:
//! they differ only in the face they pass to the container's [`SidedRules`].

use crate::error::StorageResult;
use crate::fixed::CommitHook;
use crate::preconditions;
use crate::storage::QuantityStorage;
use quantstore_txn::{Participant, SnapshotParticipant, Transaction};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One of the six spatial directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Negative y.
    Down,
    /// Positive y.
    Up,
    /// Negative z.
    North,
    /// Positive z.
    South,
    /// Negative x.
    West,
    /// Positive x.
    East,
}

impl Direction {
    /// All directions, ordered by id.
    pub const ALL: [Direction; 6] = [
        Direction::Down,
        Direction::Up,
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// Returns the id of this direction (0-5).
    #[must_use]
    pub const fn id(self) -> usize {
        self as usize
    }

    /// Returns the direction with the given id.
    #[must_use]
    pub fn from_id(id: usize) -> Option<Self> {
        Self::ALL.get(id).copied()
    }
}

/// The face a storage is accessed from.
///
/// [`Face::Any`] means no particular side: it addresses the full storage,
/// ignoring side restrictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Face {
    /// Access through one physical side.
    Side(Direction),
    /// Unrestricted access.
    Any,
}

impl Face {
    /// Number of faces.
    pub const COUNT: usize = 7;

    /// All faces, ordered by index.
    pub const ALL: [Face; Face::COUNT] = [
        Face::Side(Direction::Down),
        Face::Side(Direction::Up),
        Face::Side(Direction::North),
        Face::Side(Direction::South),
        Face::Side(Direction::West),
        Face::Side(Direction::East),
        Face::Any,
    ];

    /// Returns the table index: direction id for sides, 6 for [`Face::Any`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Face::Side(direction) => direction.id(),
            Face::Any => 6,
        }
    }

    /// Returns the face with the given table index.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Returns the direction, or `None` for [`Face::Any`].
    #[must_use]
    pub const fn direction(self) -> Option<Direction> {
        match self {
            Face::Side(direction) => Some(direction),
            Face::Any => None,
        }
    }
}

impl From<Direction> for Face {
    fn from(direction: Direction) -> Self {
        Face::Side(direction)
    }
}

impl From<Option<Direction>> for Face {
    fn from(direction: Option<Direction>) -> Self {
        direction.map_or(Face::Any, Face::Side)
    }
}

/// Capacity and per-face limits of a [`SidedContainer`].
///
/// Every method is evaluated on every operation, never cached, so the values
/// may depend on external state.
pub trait SidedRules: Send + Sync + 'static {
    /// Returns the current capacity.
    fn capacity(&self) -> u64;

    /// Returns the maximum amount accepted by a single insert from `face`.
    fn max_insert(&self, face: Face) -> u64;

    /// Returns the maximum amount released by a single extract from `face`.
    fn max_extract(&self, face: Face) -> u64;
}

struct SharedAmount {
    amount: u64,
}

impl SnapshotParticipant for SharedAmount {
    type Snapshot = u64;

    fn create_snapshot(&self) -> u64 {
        self.amount
    }

    fn read_snapshot(&mut self, snapshot: u64) {
        self.amount = snapshot;
    }
}

struct Shared<R> {
    rules: R,
    state: Participant<SharedAmount>,
}

impl<R> Shared<R> {
    fn amount(&self) -> u64 {
        self.state.read(|s| s.amount)
    }
}

/// A storage with one amount and seven independently limited facades.
pub struct SidedContainer<R: SidedRules> {
    shared: Arc<Shared<R>>,
    sides: [Arc<SideStorage<R>>; Face::COUNT],
}

impl<R: SidedRules> SidedContainer<R> {
    /// Creates an empty container.
    pub fn new(rules: R) -> Self {
        Self::build(rules, 0)
    }

    /// Creates a container holding `amount`, e.g. restored from saved state.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::AmountExceedsCapacity`] if the amount
    /// exceeds the current capacity of `rules`.
    pub fn with_amount(rules: R, amount: u64) -> StorageResult<Self> {
        let amount = preconditions::not_above(amount, rules.capacity())?;
        Ok(Self::build(rules, amount))
    }

    /// Creates a container whose final-commit hook receives the committed
    /// amount.
    pub fn with_commit_hook<F>(rules: R, amount: u64, hook: F) -> StorageResult<Self>
    where
        F: FnMut(u64) + Send + 'static,
    {
        let container = Self::with_amount(rules, amount)?;
        container.set_commit_hook(hook);
        Ok(container)
    }

    /// Installs the final-commit hook, replacing any previous one.
    ///
    /// The hook runs after the shared amount is unlocked and may read any
    /// facade.
    pub fn set_commit_hook<F>(&self, hook: F)
    where
        F: FnMut(u64) + Send + 'static,
    {
        let mut hook: CommitHook = Box::new(hook);
        self.shared
            .state
            .set_commit_hook(move |amount: &u64| hook(*amount));
    }

    fn build(rules: R, amount: u64) -> Self {
        let shared = Arc::new(Shared {
            rules,
            state: Participant::new(SharedAmount { amount }),
        });
        let sides = Face::ALL.map(|face| {
            Arc::new(SideStorage {
                face,
                shared: Arc::clone(&shared),
            })
        });
        Self { shared, sides }
    }

    /// Returns the storage facade for `face`.
    pub fn side_storage(&self, face: impl Into<Face>) -> Arc<dyn QuantityStorage> {
        let side: Arc<SideStorage<R>> = Arc::clone(&self.sides[face.into().index()]);
        side
    }

    /// Returns the shared amount.
    pub fn amount(&self) -> u64 {
        self.shared.amount()
    }

    /// Returns the current capacity.
    pub fn capacity(&self) -> u64 {
        self.shared.rules.capacity()
    }

    /// Returns the rules.
    pub fn rules(&self) -> &R {
        &self.shared.rules
    }
}

impl<R: SidedRules> fmt::Debug for SidedContainer<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SidedContainer")
            .field("amount", &self.amount())
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}

/// The storage seen from one face of a [`SidedContainer`].
pub struct SideStorage<R> {
    face: Face,
    shared: Arc<Shared<R>>,
}

impl<R: SidedRules> SideStorage<R> {
    /// Returns the face this facade serves.
    pub fn face(&self) -> Face {
        self.face
    }
}

impl<R: SidedRules> QuantityStorage for SideStorage<R> {
    fn supports_insertion(&self) -> bool {
        self.shared.rules.max_insert(self.face) > 0
    }

    fn insert(&self, max_amount: u64, txn: &mut Transaction<'_>) -> u64 {
        let rules = &self.shared.rules;
        let headroom = rules.capacity().saturating_sub(self.shared.amount());
        let inserted = rules.max_insert(self.face).min(max_amount).min(headroom);

        if inserted > 0 {
            self.shared.state.mutate(txn, |s| s.amount += inserted);
        }
        inserted
    }

    fn supports_extraction(&self) -> bool {
        self.shared.rules.max_extract(self.face) > 0
    }

    fn extract(&self, max_amount: u64, txn: &mut Transaction<'_>) -> u64 {
        let rules = &self.shared.rules;
        let extracted = rules
            .max_extract(self.face)
            .min(max_amount)
            .min(self.shared.amount());

        if extracted > 0 {
            self.shared.state.mutate(txn, |s| s.amount -= extracted);
        }
        extracted
    }

    fn amount(&self) -> u64 {
        self.shared.amount()
    }

    fn capacity(&self) -> u64 {
        self.shared.rules.capacity()
    }
}
