//! Transaction statistics.
//!
//! Counters describing how transactions and participants behaved. Useful for
//! tests and for diagnosing storages that snapshot more often than expected.

use std::sync::atomic::{AtomicU64, Ordering};

/// Transaction statistics.
///
/// All counters are atomic and can be read while transactions are in progress.
/// Values are monotonically increasing.
#[derive(Debug, Default)]
pub struct TransactionStats {
    /// Total number of root transactions opened.
    roots_started: AtomicU64,
    /// Total number of root transactions committed.
    roots_committed: AtomicU64,
    /// Total number of root transactions aborted.
    roots_aborted: AtomicU64,
    /// Total number of nested transactions opened.
    nested_opened: AtomicU64,
    /// Total number of participant snapshots taken.
    snapshots_taken: AtomicU64,
    /// Total number of participant snapshots restored by an abort.
    snapshots_restored: AtomicU64,
    /// Total number of final-commit hooks fired.
    final_commits: AtomicU64,
}

impl TransactionStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_root_start(&self) {
        self.roots_started.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_root_commit(&self) {
        self.roots_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_root_abort(&self) {
        self.roots_aborted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_nested_open(&self) {
        self.nested_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_snapshot(&self) {
        self.snapshots_taken.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_restore(&self) {
        self.snapshots_restored.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_final_commit(&self) {
        self.final_commits.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the total number of root transactions opened.
    pub fn roots_started(&self) -> u64 {
        self.roots_started.load(Ordering::Relaxed)
    }

    /// Returns the total number of root transactions committed.
    pub fn roots_committed(&self) -> u64 {
        self.roots_committed.load(Ordering::Relaxed)
    }

    /// Returns the total number of root transactions aborted.
    pub fn roots_aborted(&self) -> u64 {
        self.roots_aborted.load(Ordering::Relaxed)
    }

    /// Returns the total number of nested transactions opened.
    pub fn nested_opened(&self) -> u64 {
        self.nested_opened.load(Ordering::Relaxed)
    }

    /// Returns the total number of participant snapshots taken.
    pub fn snapshots_taken(&self) -> u64 {
        self.snapshots_taken.load(Ordering::Relaxed)
    }

    /// Returns the total number of snapshots restored by aborts.
    pub fn snapshots_restored(&self) -> u64 {
        self.snapshots_restored.load(Ordering::Relaxed)
    }

    /// Returns the total number of final-commit hooks fired.
    pub fn final_commits(&self) -> u64 {
        self.final_commits.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            roots_started: self.roots_started(),
            roots_committed: self.roots_committed(),
            roots_aborted: self.roots_aborted(),
            nested_opened: self.nested_opened(),
            snapshots_taken: self.snapshots_taken(),
            snapshots_restored: self.snapshots_restored(),
            final_commits: self.final_commits(),
        }
    }
}

/// A point-in-time copy of [`TransactionStats`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Total number of root transactions opened.
    pub roots_started: u64,
    /// Total number of root transactions committed.
    pub roots_committed: u64,
    /// Total number of root transactions aborted.
    pub roots_aborted: u64,
    /// Total number of nested transactions opened.
    pub nested_opened: u64,
    /// Total number of participant snapshots taken.
    pub snapshots_taken: u64,
    /// Total number of snapshots restored by aborts.
    pub snapshots_restored: u64,
    /// Total number of final-commit hooks fired.
    pub final_commits: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_zero() {
        let stats = TransactionStats::new();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn record_roots() {
        let stats = TransactionStats::new();

        stats.record_root_start();
        stats.record_root_start();
        stats.record_root_commit();
        stats.record_root_abort();

        assert_eq!(stats.roots_started(), 2);
        assert_eq!(stats.roots_committed(), 1);
        assert_eq!(stats.roots_aborted(), 1);
    }

    #[test]
    fn snapshot_copies_counters() {
        let stats = TransactionStats::new();
        stats.record_nested_open();
        stats.record_snapshot();
        stats.record_snapshot();
        stats.record_restore();
        stats.record_final_commit();

        let snap = stats.snapshot();
        assert_eq!(snap.nested_opened, 1);
        assert_eq!(snap.snapshots_taken, 2);
        assert_eq!(snap.snapshots_restored, 1);
        assert_eq!(snap.final_commits, 1);
    }
}
