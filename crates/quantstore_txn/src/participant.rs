//! Snapshot participants.
//!
//! A participant is any state that wants to be reverted when a transaction
//! aborts. Before each mutation it calls [`Participant::update_snapshots`]
//! (or mutates through [`Participant::mutate`], which does it for you).
//! The first such call at a nesting depth captures a snapshot and registers
//! the participant with that depth; later calls at the same depth reuse it.
//!
//! On abort the snapshot of that depth is restored. On nested commit it is
//! handed to the parent unless the parent already holds an older one. On
//! root commit it is released and [`SnapshotParticipant::on_final_commit`]
//! fires, but only if the committed state differs from the state before the
//! root opened.
//!
//! Snapshot slots belong to the root transaction that took them. A second
//! root touching the same participant gets its own slots, so each root
//! reverts only what it saw, and the overlap is logged as a warning.

use crate::state::{Journal, Transaction};
use crate::types::TransactionId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// State that can be captured and restored by transactions.
pub trait SnapshotParticipant: Send + 'static {
    /// The saved form of the mutable state.
    type Snapshot: Clone + PartialEq + Send + 'static;

    /// Captures the current state.
    fn create_snapshot(&self) -> Self::Snapshot;

    /// Restores a previously captured state.
    fn read_snapshot(&mut self, snapshot: Self::Snapshot);

    /// Called once after a root commit that changed this state.
    ///
    /// Runs with the state locked, so it may only touch the state itself.
    /// Side effects that read the participant again, such as notifying
    /// neighbours, belong in [`Participant::set_commit_hook`].
    fn on_final_commit(&mut self) {}
}

type Hook<T> = Box<dyn FnMut(&T) + Send>;

/// Snapshot slots per root transaction, one per nesting depth.
type Chains<T> = HashMap<TransactionId, Vec<Option<T>>>;

struct Inner<S: SnapshotParticipant> {
    state: Mutex<S>,
    snapshots: Mutex<Chains<S::Snapshot>>,
    on_commit: Mutex<Option<Hook<S::Snapshot>>>,
}

/// Shared handle to participant state.
///
/// Clones refer to the same state. Reads are allowed from any thread through
/// [`read`](Participant::read); mutation needs an open transaction.
pub struct Participant<S: SnapshotParticipant> {
    inner: Arc<Inner<S>>,
}

impl<S: SnapshotParticipant> Participant<S> {
    /// Wraps state into a participant.
    pub fn new(state: S) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                snapshots: Mutex::new(HashMap::new()),
                on_commit: Mutex::new(None),
            }),
        }
    }

    /// Installs the hook run after a root commit that changed the state.
    ///
    /// The hook receives the committed state and runs after the state lock
    /// is released, so it may read the participant.
    pub fn set_commit_hook<F>(&self, hook: F)
    where
        F: FnMut(&S::Snapshot) + Send + 'static,
    {
        *self.inner.on_commit.lock() = Some(Box::new(hook));
    }

    /// Captures a snapshot for the transaction's depth if none exists yet.
    ///
    /// Must be called before every mutation of the state.
    pub fn update_snapshots(&self, txn: &mut Transaction<'_>) {
        let id = txn.id();
        let depth = txn.depth();
        let mut snapshots = self.inner.snapshots.lock();
        if !snapshots.contains_key(&id) && !snapshots.is_empty() {
            let others: Vec<TransactionId> = snapshots.keys().copied().collect();
            warn!(txn = %id, ?others, "participant touched by overlapping root transactions");
        }

        let chain = snapshots.entry(id).or_default();
        if chain.len() <= depth {
            chain.resize_with(depth + 1, || None);
        }
        let slot = &mut chain[depth];
        if slot.is_some() {
            return;
        }
        *slot = Some(self.inner.state.lock().create_snapshot());
        drop(snapshots);

        let journal: Arc<dyn Journal> = self.inner.clone();
        txn.register(journal);
    }

    /// Mutates the state inside a transaction.
    pub fn mutate<R>(&self, txn: &mut Transaction<'_>, f: impl FnOnce(&mut S) -> R) -> R {
        self.update_snapshots(txn);
        let mut state = self.inner.state.lock();
        f(&mut state)
    }

    /// Reads the state.
    ///
    /// Outside the transaction's own context the result is advisory only.
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        let state = self.inner.state.lock();
        f(&state)
    }

    /// Returns true if any open root holds a snapshot for the given depth.
    #[must_use]
    pub fn has_snapshot_at(&self, depth: usize) -> bool {
        self.inner
            .snapshots
            .lock()
            .values()
            .any(|chain| chain.get(depth).is_some_and(Option::is_some))
    }
}

impl<S: SnapshotParticipant> Clone for Participant<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: SnapshotParticipant> fmt::Debug for Participant<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pending: usize = self
            .inner
            .snapshots
            .lock()
            .values()
            .map(|chain| chain.iter().flatten().count())
            .sum();
        f.debug_struct("Participant")
            .field("pending_snapshots", &pending)
            .finish_non_exhaustive()
    }
}

/// Removes the chain of `id` once it holds no snapshot.
fn prune<T>(snapshots: &mut Chains<T>, id: TransactionId) {
    if snapshots
        .get(&id)
        .is_some_and(|chain| chain.iter().all(Option::is_none))
    {
        snapshots.remove(&id);
    }
}

impl<S: SnapshotParticipant> Journal for Inner<S> {
    fn rollback(&self, id: TransactionId, depth: usize) {
        let snapshot = {
            let mut snapshots = self.snapshots.lock();
            let snapshot = snapshots
                .get_mut(&id)
                .and_then(|chain| chain.get_mut(depth))
                .and_then(Option::take);
            prune(&mut snapshots, id);
            snapshot
        };
        if let Some(snapshot) = snapshot {
            self.state.lock().read_snapshot(snapshot);
        }
    }

    fn promote(&self, id: TransactionId, depth: usize) -> bool {
        let mut snapshots = self.snapshots.lock();
        let Some(chain) = snapshots.get_mut(&id) else {
            return false;
        };
        let Some(snapshot) = chain.get_mut(depth).and_then(Option::take) else {
            return false;
        };
        let adopted = match depth.checked_sub(1).and_then(|parent| chain.get_mut(parent)) {
            Some(parent) if parent.is_none() => {
                *parent = Some(snapshot);
                true
            }
            _ => false,
        };
        prune(&mut snapshots, id);
        adopted
    }

    fn finish(&self, id: TransactionId) -> bool {
        let root = {
            let mut snapshots = self.snapshots.lock();
            let root = snapshots
                .get_mut(&id)
                .and_then(|chain| chain.first_mut())
                .and_then(Option::take);
            snapshots.remove(&id);
            root
        };
        let Some(root) = root else {
            return false;
        };

        let committed = {
            let mut state = self.state.lock();
            let committed = state.create_snapshot();
            if committed == root {
                return false;
            }
            state.on_final_commit();
            committed
        };

        // Taken out while it runs so a hook that commits this participant
        // again cannot block on itself.
        let hook = self.on_commit.lock().take();
        if let Some(mut hook) = hook {
            hook(&committed);
            let mut slot = self.on_commit.lock();
            if slot.is_none() {
                *slot = Some(hook);
            }
        }
        true
    }
}
