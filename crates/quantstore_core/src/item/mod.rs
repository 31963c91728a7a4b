//! Storages whose amount is embedded in a stack of identical units.
//!
//! A [`StackContext`] exposes the slot; [`ItemVariant`] carries the per-unit
//! amount in its [`UnitData`]. Storages built here never edit a unit in
//! place: every change exchanges the whole stack for a new variant.

mod context;
mod extract_only;
mod simple;
mod slot;
mod storage_item;
mod variant;

pub use context::StackContext;
pub use extract_only::ExtractOnlyItemStorage;
pub use simple::ItemBackedStorage;
pub use slot::{SlotContext, DEFAULT_MAX_COUNT};
pub use storage_item::StorageItem;
pub use variant::{ItemKind, ItemVariant, UnitData, STORED_AMOUNT_KEY};
