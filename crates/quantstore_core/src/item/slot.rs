//! In-memory single-slot stack context.

use super::context::StackContext;
use super::variant::ItemVariant;
use quantstore_txn::{Participant, SnapshotParticipant, Transaction};
use std::fmt;

/// Default maximum number of units in one slot.
pub const DEFAULT_MAX_COUNT: u64 = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
struct SlotContents {
    variant: ItemVariant,
    count: u64,
}

impl SnapshotParticipant for SlotContents {
    type Snapshot = SlotContents;

    fn create_snapshot(&self) -> SlotContents {
        self.clone()
    }

    fn read_snapshot(&mut self, snapshot: SlotContents) {
        *self = snapshot;
    }
}

/// A stack context backed by one in-memory slot.
///
/// This context is suitable for:
/// - Unit and integration tests
/// - Hosts that hold a detached stack, e.g. an item in a cursor
///
/// The slot accepts units only while it is empty or holds the same variant,
/// up to a maximum count. Its contents roll back with transactions.
///
/// # Example
///
/// ```rust
/// use quantstore_core::{ItemVariant, SlotContext, StackContext};
///
/// let slot = SlotContext::new(ItemVariant::of("battery"), 4);
/// assert_eq!(slot.count(), 4);
/// ```
#[derive(Clone)]
pub struct SlotContext {
    contents: Participant<SlotContents>,
    max_count: u64,
}

impl SlotContext {
    /// Creates a slot holding `count` units of `variant`.
    #[must_use]
    pub fn new(variant: ItemVariant, count: u64) -> Self {
        Self::with_max_count(variant, count, DEFAULT_MAX_COUNT.max(count))
    }

    /// Creates a slot with an explicit maximum count.
    #[must_use]
    pub fn with_max_count(variant: ItemVariant, count: u64, max_count: u64) -> Self {
        let contents = if count == 0 || variant.is_blank() {
            SlotContents {
                variant: ItemVariant::blank(),
                count: 0,
            }
        } else {
            SlotContents { variant, count }
        };
        Self {
            contents: Participant::new(contents),
            max_count,
        }
    }

    /// Creates an empty slot.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(ItemVariant::blank(), 0)
    }

    /// Returns the maximum number of units the slot holds.
    #[must_use]
    pub fn max_count(&self) -> u64 {
        self.max_count
    }

    /// Returns the variant and count currently in the slot.
    #[must_use]
    pub fn stack(&self) -> (ItemVariant, u64) {
        self.contents.read(|c| (c.variant.clone(), c.count))
    }
}

impl StackContext for SlotContext {
    fn variant(&self) -> ItemVariant {
        self.contents.read(|c| c.variant.clone())
    }

    fn count(&self) -> u64 {
        self.contents.read(|c| c.count)
    }

    fn insert(&self, variant: &ItemVariant, max_count: u64, txn: &mut Transaction<'_>) -> u64 {
        if variant.is_blank() || max_count == 0 {
            return 0;
        }

        let (accepts, count) = self
            .contents
            .read(|c| (c.count == 0 || &c.variant == variant, c.count));
        if !accepts {
            return 0;
        }

        let inserted = max_count.min(self.max_count.saturating_sub(count));
        if inserted > 0 {
            self.contents.mutate(txn, |c| {
                c.variant = variant.clone();
                c.count += inserted;
            });
        }
        inserted
    }

    fn extract(&self, variant: &ItemVariant, max_count: u64, txn: &mut Transaction<'_>) -> u64 {
        let available = self
            .contents
            .read(|c| if &c.variant == variant { c.count } else { 0 });

        let extracted = max_count.min(available);
        if extracted > 0 {
            self.contents.mutate(txn, |c| {
                c.count -= extracted;
                if c.count == 0 {
                    c.variant = ItemVariant::blank();
                }
            });
        }
        extracted
    }
}

impl fmt::Debug for SlotContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (variant, count) = self.stack();
        f.debug_struct("SlotContext")
            .field("variant", &variant)
            .field("count", &count)
            .field("max_count", &self.max_count)
            .finish()
    }
}
