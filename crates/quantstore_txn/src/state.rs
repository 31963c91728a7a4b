//! Transaction state.

use crate::stats::TransactionStats;
use crate::types::{TransactionId, TransactionResult};
use parking_lot::MutexGuard;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// State of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is open and can perform operations.
    Open,
    /// Transaction has been committed.
    Committed,
    /// Transaction has been aborted.
    Aborted,
}

/// Rollback obligations a participant registers with a transaction depth.
///
/// Snapshots are owned by the root `id` they were taken under.
pub(crate) trait Journal: Send + Sync {
    /// Restores the snapshot taken at `depth`.
    fn rollback(&self, id: TransactionId, depth: usize);

    /// Hands the snapshot at `depth` to `depth - 1`.
    ///
    /// Returns true if the parent had no snapshot of its own and the
    /// participant must now be registered with the parent.
    fn promote(&self, id: TransactionId, depth: usize) -> bool;

    /// Releases the root snapshot after the root committed.
    ///
    /// Returns true if the final-commit hook fired.
    fn finish(&self, id: TransactionId) -> bool;
}

type CloseCallback = Box<dyn FnOnce(TransactionResult)>;

/// Pending obligations of one nesting depth.
#[derive(Default)]
struct Frame {
    journals: Vec<Arc<dyn Journal>>,
    close_callbacks: Vec<CloseCallback>,
}

/// All frames of one root transaction, innermost last.
struct FrameStack {
    id: TransactionId,
    frames: Vec<Frame>,
    outer_callbacks: Vec<CloseCallback>,
    stats: Arc<TransactionStats>,
}

enum Scope<'a> {
    /// The root owns the frame stack and keeps the manager locked.
    Root {
        frames: FrameStack,
        _guard: MutexGuard<'a, ()>,
    },
    /// A nested transaction borrows its parent's frame stack.
    Nested(&'a mut FrameStack),
}

impl Scope<'_> {
    fn frames(&self) -> &FrameStack {
        match self {
            Scope::Root { frames, .. } => frames,
            Scope::Nested(frames) => frames,
        }
    }

    fn frames_mut(&mut self) -> &mut FrameStack {
        match self {
            Scope::Root { frames, .. } => frames,
            Scope::Nested(frames) => frames,
        }
    }
}

/// An open transaction.
///
/// A transaction bounds tentative mutations. Closing it with [`commit`]
/// keeps them; [`abort`] or simply dropping it reverts every participant
/// touched since it opened.
///
/// Nested transactions are opened with [`open_nested`], which borrows the
/// parent exclusively: the parent cannot be used again until the child is
/// closed, so nesting always follows stack discipline.
///
/// [`commit`]: Transaction::commit
/// [`abort`]: Transaction::abort
/// [`open_nested`]: Transaction::open_nested
pub struct Transaction<'a> {
    scope: Scope<'a>,
    depth: usize,
    state: TransactionState,
}

impl<'a> Transaction<'a> {
    /// Creates a root transaction.
    pub(crate) fn root(
        id: TransactionId,
        guard: MutexGuard<'a, ()>,
        stats: Arc<TransactionStats>,
    ) -> Self {
        let frames = FrameStack {
            id,
            frames: vec![Frame::default()],
            outer_callbacks: Vec::new(),
            stats,
        };
        Self {
            scope: Scope::Root {
                frames,
                _guard: guard,
            },
            depth: 0,
            state: TransactionState::Open,
        }
    }

    /// Returns the ID of the root this transaction belongs to.
    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.scope.frames().id
    }

    /// Returns the nesting depth. The root transaction has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns true for the root transaction.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.depth == 0
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Checks if the transaction is still open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == TransactionState::Open
    }

    /// Opens a nested transaction.
    ///
    /// Aborting the child reverts only what happened since it opened.
    /// Committing it hands its rollback obligations to this transaction.
    pub fn open_nested(&mut self) -> Transaction<'_> {
        let depth = self.depth + 1;
        let stack = self.scope.frames_mut();
        stack.frames.push(Frame::default());
        stack.stats.record_nested_open();
        trace!(txn = %stack.id, depth, "opened nested transaction");

        Transaction {
            scope: Scope::Nested(stack),
            depth,
            state: TransactionState::Open,
        }
    }

    /// Registers a callback invoked when this transaction closes.
    ///
    /// Runs after participants have been restored (on abort) or handed to
    /// the parent (on commit).
    pub fn add_close_callback<F>(&mut self, callback: F)
    where
        F: FnOnce(TransactionResult) + 'static,
    {
        if let Some(frame) = self.scope.frames_mut().frames.last_mut() {
            frame.close_callbacks.push(Box::new(callback));
        }
    }

    /// Registers a callback invoked once when the root transaction closes.
    ///
    /// May be called from any depth; the callback always waits for the root.
    /// It runs after final-commit hooks, while the manager still reports the
    /// root as open.
    pub fn add_outer_close_callback<F>(&mut self, callback: F)
    where
        F: FnOnce(TransactionResult) + 'static,
    {
        self.scope
            .frames_mut()
            .outer_callbacks
            .push(Box::new(callback));
    }

    /// Commits the transaction.
    pub fn commit(mut self) {
        self.close(TransactionResult::Committed);
    }

    /// Aborts the transaction, reverting every participant touched since it
    /// opened.
    pub fn abort(mut self) {
        self.close(TransactionResult::Aborted);
    }

    /// Registers a participant that just took a snapshot at this depth.
    pub(crate) fn register(&mut self, journal: Arc<dyn Journal>) {
        let depth = self.depth;
        let stack = self.scope.frames_mut();
        debug_assert_eq!(stack.frames.len(), depth + 1);
        stack.stats.record_snapshot();
        trace!(txn = %stack.id, depth, "participant snapshot taken");
        if let Some(frame) = stack.frames.last_mut() {
            frame.journals.push(journal);
        }
    }

    fn close(&mut self, result: TransactionResult) {
        if self.state != TransactionState::Open {
            return;
        }
        self.state = match result {
            TransactionResult::Committed => TransactionState::Committed,
            TransactionResult::Aborted => TransactionState::Aborted,
        };

        let depth = self.depth;
        let stack = self.scope.frames_mut();
        let Some(Frame {
            journals,
            close_callbacks,
        }) = stack.frames.pop()
        else {
            return;
        };

        match (result, stack.frames.last_mut()) {
            (TransactionResult::Aborted, _) => {
                for journal in journals.iter().rev() {
                    journal.rollback(stack.id, depth);
                    stack.stats.record_restore();
                }
            }
            (TransactionResult::Committed, Some(parent)) => {
                for journal in journals {
                    if journal.promote(stack.id, depth) {
                        parent.journals.push(journal);
                    }
                }
            }
            (TransactionResult::Committed, None) => {
                for journal in &journals {
                    if journal.finish(stack.id) {
                        stack.stats.record_final_commit();
                    }
                }
            }
        }

        for callback in close_callbacks {
            callback(result);
        }

        if depth == 0 {
            match result {
                TransactionResult::Committed => stack.stats.record_root_commit(),
                TransactionResult::Aborted => stack.stats.record_root_abort(),
            }
            for callback in std::mem::take(&mut stack.outer_callbacks) {
                callback(result);
            }
            debug!(txn = %stack.id, %result, "closed root transaction");
        } else {
            trace!(txn = %stack.id, depth, %result, "closed nested transaction");
        }
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        self.close(TransactionResult::Aborted);
    }
}

impl fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id())
            .field("depth", &self.depth)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
