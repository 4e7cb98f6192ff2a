//! Transaction statistics.
//!
//! Counters for monitoring how often transactions commit, abort and conflict.
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use txkv_core::TransactionDb;
//! use txkv_storage::InMemoryStore;
//!
//! let db = TransactionDb::new(Arc::new(InMemoryStore::new()));
//! db.transaction(|txn| txn.put(b"k", b"v")).unwrap();
//!
//! let stats = db.stats().snapshot();
//! assert_eq!(stats.committed, 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Transaction statistics.
///
/// All counters are atomic and can be read while transactions are running.
/// Values only ever increase.
#[derive(Debug, Default)]
pub struct TransactionStats {
    /// Transactions started.
    started: AtomicU64,
    /// Transactions committed, including read-only ones.
    committed: AtomicU64,
    /// Commits that had no writes and skipped the commit lock.
    read_only_commits: AtomicU64,
    /// Transactions that ended aborted, for any reason.
    aborted: AtomicU64,
    /// Conflicts detected by `get`.
    read_conflicts: AtomicU64,
    /// Conflicts detected during commit validation.
    commit_conflicts: AtomicU64,
    /// Commits whose batch the store refused.
    apply_failures: AtomicU64,
}

impl TransactionStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_start(&self) {
        self.started.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_commit(&self, read_only: bool) {
        self.committed.fetch_add(1, Ordering::Relaxed);
        if read_only {
            self.read_only_commits.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_abort(&self) {
        self.aborted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_read_conflict(&self) {
        self.read_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_commit_conflict(&self) {
        self.commit_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_apply_failure(&self) {
        self.apply_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of transactions started.
    pub fn started(&self) -> u64 {
        self.started.load(Ordering::Relaxed)
    }

    /// Returns the number of transactions committed.
    pub fn committed(&self) -> u64 {
        self.committed.load(Ordering::Relaxed)
    }

    /// Returns the number of transactions aborted.
    pub fn aborted(&self) -> u64 {
        self.aborted.load(Ordering::Relaxed)
    }

    /// Returns the total number of conflicts, on reads and at commit.
    pub fn conflicts(&self) -> u64 {
        self.read_conflicts.load(Ordering::Relaxed) + self.commit_conflicts.load(Ordering::Relaxed)
    }

    /// Returns a point-in-time copy of every counter.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            started: self.started.load(Ordering::Relaxed),
            committed: self.committed.load(Ordering::Relaxed),
            read_only_commits: self.read_only_commits.load(Ordering::Relaxed),
            aborted: self.aborted.load(Ordering::Relaxed),
            read_conflicts: self.read_conflicts.load(Ordering::Relaxed),
            commit_conflicts: self.commit_conflicts.load(Ordering::Relaxed),
            apply_failures: self.apply_failures.load(Ordering::Relaxed),
        }
    }
}

/// A plain copy of [`TransactionStats`] at one moment.
///
/// Counters are loaded one at a time, so a snapshot taken while transactions
/// are running may be slightly inconsistent across fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Transactions started.
    pub started: u64,
    /// Transactions committed.
    pub committed: u64,
    /// Commits with no writes.
    pub read_only_commits: u64,
    /// Transactions aborted.
    pub aborted: u64,
    /// Conflicts detected by `get`.
    pub read_conflicts: u64,
    /// Conflicts detected at commit.
    pub commit_conflicts: u64,
    /// Commits the store refused to apply.
    pub apply_failures: u64,
}

impl StatsSnapshot {
    /// Transactions that have neither committed nor aborted, as far as this
    /// snapshot can tell.
    #[must_use]
    pub fn in_flight(&self) -> u64 {
        self.started
            .saturating_sub(self.committed)
            .saturating_sub(self.aborted)
    }
}
