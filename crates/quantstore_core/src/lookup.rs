//! Lookup registries that resolve storages for positions and stacks.

use crate::item::{ItemKind, StackContext, StorageItem};
use crate::sided::{Face, SidedContainer, SidedRules};
use crate::storage::{EmptyStorage, QuantityStorage};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

type BlockProvider = Arc<dyn Fn(Face) -> Option<Arc<dyn QuantityStorage>> + Send + Sync>;
type ItemProvider =
    Arc<dyn Fn(Arc<dyn StackContext>) -> Option<Arc<dyn QuantityStorage>> + Send + Sync>;

/// A position in the host world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate.
    pub y: i32,
    /// Z coordinate.
    pub z: i32,
}

impl BlockPos {
    /// Creates a position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Resolves the storage exposed at a position through a face.
///
/// At most one provider is registered per position. A provider may return
/// `None` for faces it does not expose.
#[derive(Default)]
pub struct BlockLookup {
    providers: RwLock<HashMap<BlockPos, BlockProvider>>,
}

impl BlockLookup {
    /// Creates an empty lookup.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `provider` at `pos`, replacing any previous one.
    pub fn register<F>(&self, pos: BlockPos, provider: F)
    where
        F: Fn(Face) -> Option<Arc<dyn QuantityStorage>> + Send + Sync + 'static,
    {
        debug!(%pos, "registering block storage provider");
        self.providers.write().insert(pos, Arc::new(provider));
    }

    /// Registers a sided container at `pos`, exposing one facade per face.
    pub fn register_sided<R: SidedRules>(&self, pos: BlockPos, container: Arc<SidedContainer<R>>) {
        self.register(pos, move |face| Some(container.side_storage(face)));
    }

    /// Removes the provider at `pos`. Returns true if one was registered.
    pub fn unregister(&self, pos: BlockPos) -> bool {
        self.providers.write().remove(&pos).is_some()
    }

    /// Returns the storage at `pos` for `face`, if any.
    pub fn find(&self, pos: BlockPos, face: impl Into<Face>) -> Option<Arc<dyn QuantityStorage>> {
        // provider runs outside the lock so it may query the lookup
        let provider = self.providers.read().get(&pos).cloned()?;
        provider(face.into())
    }

    /// Returns the storage at `pos` for `face`, or an empty storage.
    pub fn find_or_empty(&self, pos: BlockPos, face: impl Into<Face>) -> Arc<dyn QuantityStorage> {
        self.find(pos, face).unwrap_or_else(EmptyStorage::shared)
    }

    /// Returns the number of registered positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.read().len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }
}

impl fmt::Debug for BlockLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockLookup")
            .field("positions", &self.len())
            .finish()
    }
}

/// Resolves the storage of a stack from the item kind it currently holds.
///
/// Kind-specific providers are tried first, then fallbacks in registration
/// order. Empty slots resolve to nothing.
#[derive(Default)]
pub struct ItemLookup {
    providers: RwLock<HashMap<ItemKind, ItemProvider>>,
    fallbacks: RwLock<Vec<ItemProvider>>,
}

impl ItemLookup {
    /// Creates an empty lookup.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `provider` for stacks of `kind`, replacing any previous one.
    pub fn register<F>(&self, kind: impl Into<ItemKind>, provider: F)
    where
        F: Fn(Arc<dyn StackContext>) -> Option<Arc<dyn QuantityStorage>> + Send + Sync + 'static,
    {
        let kind = kind.into();
        debug!(kind = kind.as_str(), "registering item storage provider");
        self.providers.write().insert(kind, Arc::new(provider));
    }

    /// Registers a [`StorageItem`] implementation for stacks of `kind`.
    pub fn register_storage_item<I>(&self, kind: impl Into<ItemKind>, item: Arc<I>)
    where
        I: StorageItem + 'static,
    {
        self.register(kind, move |ctx| {
            let storage: Arc<dyn QuantityStorage> = Arc::new(item.create_storage(ctx));
            Some(storage)
        });
    }

    /// Registers a provider consulted when no kind-specific one matches.
    pub fn register_fallback<F>(&self, provider: F)
    where
        F: Fn(Arc<dyn StackContext>) -> Option<Arc<dyn QuantityStorage>> + Send + Sync + 'static,
    {
        self.fallbacks.write().push(Arc::new(provider));
    }

    /// Returns the storage for the stack in `ctx`, if any.
    pub fn find(&self, ctx: Arc<dyn StackContext>) -> Option<Arc<dyn QuantityStorage>> {
        let variant = ctx.variant();
        if variant.is_blank() {
            return None;
        }

        let specific = self.providers.read().get(variant.kind()).cloned();
        if let Some(provider) = specific {
            if let Some(storage) = provider(Arc::clone(&ctx)) {
                return Some(storage);
            }
        }

        let fallbacks = self.fallbacks.read().clone();
        fallbacks
            .iter()
            .find_map(|provider| provider(Arc::clone(&ctx)))
    }

    /// Returns the storage for the stack in `ctx`, or an empty storage.
    pub fn find_or_empty(&self, ctx: Arc<dyn StackContext>) -> Arc<dyn QuantityStorage> {
        self.find(ctx).unwrap_or_else(EmptyStorage::shared)
    }
}

impl fmt::Debug for ItemLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemLookup")
            .field("kinds", &self.providers.read().len())
            .field("fallbacks", &self.fallbacks.read().len())
            .finish()
    }
}
