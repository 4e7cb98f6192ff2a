//! The transaction object.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::stats::TransactionStats;
use crate::transaction::serializer;
use crate::transaction::state::{BufferEntry, ReadSet, TransactionState, WriteBuffer};
use crate::transaction::validation::validate_snapshot_isolation;
use crate::types::TransactionId;
use std::sync::Arc;
use tracing::{debug, trace, warn};
use txkv_storage::{KvStore, SequenceNumber, Snapshot};

/// A snapshot-isolated, optimistically validated transaction.
///
/// A transaction pins a snapshot of the store when it begins. Writes are
/// buffered locally and only reach the store, as one atomic batch, when
/// [`Transaction::commit`] succeeds. Reads that are not served from the
/// transaction's own writes are validated against the live store as they
/// happen, and validated again at commit.
///
/// The snapshot is released when the transaction is dropped, whatever state
/// it ended in.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use txkv_core::{Transaction, TransactionState};
/// use txkv_storage::{InMemoryStore, KvStore};
///
/// let store = Arc::new(InMemoryStore::new());
///
/// let mut txn = Transaction::begin(store.clone());
/// txn.put(b"a", b"1").unwrap();
/// txn.put(b"b", b"2").unwrap();
/// assert_eq!(txn.get(b"a").unwrap(), Some(b"1".to_vec()));
/// txn.commit().unwrap();
/// assert_eq!(txn.state(), TransactionState::Committed);
///
/// assert_eq!(store.get(b"b", None).unwrap(), Some(b"2".to_vec()));
/// ```
pub struct Transaction {
    id: TransactionId,
    store: Arc<dyn KvStore>,
    /// `None` only when the transaction could not start.
    snapshot: Option<Snapshot>,
    state: TransactionState,
    reads: ReadSet,
    writes: WriteBuffer,
    config: Config,
    stats: Option<Arc<TransactionStats>>,
}

impl Transaction {
    /// Begins a transaction with the default configuration.
    ///
    /// This never fails. If the store is closed or refuses a snapshot, the
    /// returned transaction is already [`TransactionState::Aborted`] and every
    /// operation on it fails with [`CoreError::InvalidArgument`].
    pub fn begin(store: Arc<dyn KvStore>) -> Self {
        Self::begin_with_config(store, Config::default())
    }

    /// Begins a transaction with a custom configuration.
    pub fn begin_with_config(store: Arc<dyn KvStore>, config: Config) -> Self {
        Self::start(store, config, None)
    }

    pub(crate) fn start(
        store: Arc<dyn KvStore>,
        config: Config,
        stats: Option<Arc<TransactionStats>>,
    ) -> Self {
        let id = TransactionId::next();
        if let Some(stats) = &stats {
            stats.record_start();
        }

        let snapshot = if store.is_closed() {
            debug!(txn = %id, "store is closed, transaction starts aborted");
            None
        } else {
            match store.snapshot() {
                Ok(snapshot) => Some(snapshot),
                Err(err) => {
                    debug!(txn = %id, error = %err, "snapshot unavailable, transaction starts aborted");
                    None
                }
            }
        };

        let state = match &snapshot {
            Some(snapshot) => {
                trace!(txn = %id, snapshot = %snapshot.sequence(), "transaction started");
                TransactionState::Active
            }
            None => {
                if let Some(stats) = &stats {
                    stats.record_abort();
                }
                TransactionState::Aborted
            }
        };

        Self {
            id,
            store,
            snapshot,
            state,
            reads: ReadSet::new(),
            writes: WriteBuffer::default(),
            config,
            stats,
        }
    }

    /// Returns the transaction ID.
    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Checks if the transaction is still active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Returns the sequence number of the pinned snapshot.
    #[must_use]
    pub fn snapshot_sequence(&self) -> Option<SequenceNumber> {
        self.snapshot.as_ref().map(Snapshot::sequence)
    }

    /// Returns the number of distinct keys written.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.len()
    }

    /// Returns the number of distinct keys read through the snapshot.
    #[must_use]
    pub fn read_count(&self) -> usize {
        self.reads.len()
    }

    /// Returns the buffered write for `key`, if any.
    #[must_use]
    pub fn pending_write(&self, key: &[u8]) -> Option<&BufferEntry> {
        self.writes.get(key)
    }

    /// Returns the configuration this transaction was started with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Reads a key.
    ///
    /// Keys this transaction has written are answered from the write buffer
    /// (`None` for a pending delete) without touching the store. Any other key
    /// is validated against the live store: if it changed since the snapshot
    /// the transaction is aborted and [`CoreError::Conflict`] is returned.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidArgument`] if the transaction is not active
    /// - [`CoreError::Conflict`] if the key changed since the snapshot
    /// - [`CoreError::Storage`] if the store fails; the transaction stays active
    pub fn get(&mut self, key: &[u8]) -> CoreResult<Option<Vec<u8>>> {
        let snapshot = self.check_active()?;

        if let Some(entry) = self.writes.get(key) {
            return Ok(entry.value().map(<[u8]>::to_vec));
        }

        match validate_snapshot_isolation(self.store.as_ref(), snapshot, key) {
            Ok(value) => {
                self.reads.insert(key.to_vec());
                Ok(value)
            }
            Err(err) => {
                if err.is_conflict() {
                    debug!(txn = %self.id, key_len = key.len(), "read conflict");
                    if let Some(stats) = &self.stats {
                        stats.record_read_conflict();
                    }
                    self.abort_active();
                }
                Err(err)
            }
        }
    }

    /// Buffers a write of `value` to `key`.
    ///
    /// Replaces any earlier write or delete of the same key in this
    /// transaction. Nothing is checked against the store until commit.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if the transaction is not active.
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> CoreResult<()> {
        self.check_active()?;
        self.writes.put(key, value);
        Ok(())
    }

    /// Buffers a delete of `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if the transaction is not active.
    pub fn delete(&mut self, key: &[u8]) -> CoreResult<()> {
        self.check_active()?;
        self.writes.delete(key);
        Ok(())
    }

    /// Commits the transaction.
    ///
    /// A transaction with no writes commits immediately without touching the
    /// store. Otherwise the process-wide commit lock is taken, every key in the
    /// read set and then the write set is re-validated against the snapshot,
    /// and the buffered batch is applied atomically.
    ///
    /// Once the active check passes, the transaction always ends either
    /// committed or aborted: a conflict, a store error during validation, and
    /// a failed apply all abort it.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidArgument`] if the transaction is not active
    /// - [`CoreError::Conflict`] naming the first key that failed validation
    /// - [`CoreError::Storage`] with the store's error if validation reads or
    ///   the apply fail
    pub fn commit(&mut self) -> CoreResult<()> {
        self.check_active()?;

        if self.writes.is_empty() {
            self.state = TransactionState::Committed;
            if let Some(stats) = &self.stats {
                stats.record_commit(true);
            }
            trace!(txn = %self.id, reads = self.reads.len(), "read-only transaction committed");
            return Ok(());
        }

        let _commit = serializer::acquire();

        if let Err(err) = self.validate_for_commit() {
            if err.is_conflict() {
                if let Some(stats) = &self.stats {
                    stats.record_commit_conflict();
                }
            }
            debug!(txn = %self.id, error = %err, "commit validation failed");
            self.abort_active();
            return Err(err);
        }

        let options = self.config.write_options();
        match self.store.write(&options, self.writes.batch()) {
            Ok(()) => {
                let writes = self.writes.len();
                self.writes.clear();
                self.state = TransactionState::Committed;
                if let Some(stats) = &self.stats {
                    stats.record_commit(false);
                }
                debug!(txn = %self.id, writes, "transaction committed");
                Ok(())
            }
            Err(err) => {
                warn!(txn = %self.id, error = %err, "store rejected commit batch, aborting");
                if let Some(stats) = &self.stats {
                    stats.record_apply_failure();
                }
                self.abort_active();
                Err(err.into())
            }
        }
    }

    /// Aborts the transaction, discarding buffered writes.
    ///
    /// Aborting an aborted transaction is a no-op. The snapshot stays pinned
    /// until the transaction is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if the transaction has already
    /// committed.
    pub fn abort(&mut self) -> CoreResult<()> {
        match self.state {
            TransactionState::Committed => Err(CoreError::invalid_argument(
                "cannot roll back a committed transaction",
            )),
            TransactionState::Aborted => Ok(()),
            TransactionState::Active => {
                self.abort_active();
                Ok(())
            }
        }
    }

    /// Checks that operations are allowed and hands back the snapshot.
    fn check_active(&self) -> CoreResult<&Snapshot> {
        match self.state {
            TransactionState::Active => {}
            TransactionState::Committed => {
                return Err(CoreError::invalid_argument("transaction has been committed"))
            }
            TransactionState::Aborted => {
                return Err(CoreError::invalid_argument("transaction has been aborted"))
            }
        }
        if self.store.is_closed() {
            return Err(CoreError::invalid_argument("store is closed"));
        }
        self.snapshot
            .as_ref()
            .ok_or_else(|| CoreError::invalid_argument("snapshot is not held"))
    }

    /// Re-validates the read set, then the write set. Caller holds the commit lock.
    fn validate_for_commit(&self) -> CoreResult<()> {
        let snapshot = self
            .snapshot
            .as_ref()
            .ok_or_else(|| CoreError::invalid_argument("snapshot is not held"))?;
        let store = self.store.as_ref();

        for key in &self.reads {
            validate_snapshot_isolation(store, snapshot, key)?;
        }
        for key in self.writes.keys() {
            validate_snapshot_isolation(store, snapshot, key)?;
        }
        Ok(())
    }

    /// Moves an active transaction to aborted.
    fn abort_active(&mut self) {
        debug_assert!(self.is_active());
        let discarded = self.writes.len();
        self.writes.clear();
        self.state = TransactionState::Aborted;
        if let Some(stats) = &self.stats {
            stats.record_abort();
        }
        debug!(txn = %self.id, discarded, "transaction aborted");
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.is_active() {
            trace!(txn = %self.id, "active transaction dropped");
            self.abort_active();
        }
        if let Some(snapshot) = self.snapshot.take() {
            self.store.release_snapshot(snapshot);
        }
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("snapshot", &self.snapshot_sequence())
            .field("reads", &self.reads.len())
            .field("writes", &self.writes.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use txkv_storage::{InMemoryStore, StorageError, StorageResult, WriteBatch, WriteOptions};

    /// Wraps an in-memory store and fails on demand.
    #[derive(Default)]
    struct FlakyStore {
        inner: InMemoryStore,
        fail_snapshots: AtomicBool,
        fail_reads: AtomicBool,
        fail_writes: AtomicBool,
        last_sync: AtomicBool,
    }

    impl KvStore for FlakyStore {
        fn snapshot(&self) -> StorageResult<Snapshot> {
            if self.fail_snapshots.load(Ordering::SeqCst) {
                return Err(StorageError::unavailable("snapshots disabled"));
            }
            self.inner.snapshot()
        }

        fn release_snapshot(&self, snapshot: Snapshot) {
            self.inner.release_snapshot(snapshot);
        }

        fn get(&self, key: &[u8], snapshot: Option<&Snapshot>) -> StorageResult<Option<Vec<u8>>> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(StorageError::unavailable("io"));
            }
            self.inner.get(key, snapshot)
        }

        fn write(&self, options: &WriteOptions, batch: &WriteBatch) -> StorageResult<()> {
            self.last_sync.store(options.sync, Ordering::SeqCst);
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StorageError::write_rejected("disk full"));
            }
            self.inner.write(options, batch)
        }

        fn is_closed(&self) -> bool {
            self.inner.is_closed()
        }
    }

    fn store() -> Arc<InMemoryStore> {
        Arc::new(InMemoryStore::new())
    }

    fn put(store: &InMemoryStore, key: &[u8], value: &[u8]) {
        let mut batch = WriteBatch::new();
        batch.put(key, value);
        store.write(&WriteOptions::default(), &batch).unwrap();
    }

    #[test]
    fn begin_pins_snapshot_and_drop_releases_it() {
        let store = store();
        put(&store, b"k", b"v");

        let txn = Transaction::begin(store.clone());
        assert!(txn.is_active());
        assert_eq!(txn.snapshot_sequence(), Some(SequenceNumber::new(1)));
        assert_eq!(store.live_snapshots(), 1);

        drop(txn);
        assert_eq!(store.live_snapshots(), 0);
    }

    #[test]
    fn snapshot_released_after_commit_and_abort() {
        let store = store();

        let mut committed = Transaction::begin(store.clone());
        committed.put(b"a", b"1").unwrap();
        committed.commit().unwrap();

        let mut aborted = Transaction::begin(store.clone());
        aborted.put(b"b", b"2").unwrap();
        aborted.abort().unwrap();

        // Terminal transactions still hold their snapshots until dropped.
        assert_eq!(store.live_snapshots(), 2);
        drop(committed);
        drop(aborted);
        assert_eq!(store.live_snapshots(), 0);
    }

    #[test]
    fn closed_store_starts_aborted() {
        let store = store();
        store.close();

        let mut txn = Transaction::begin(store.clone());
        assert_eq!(txn.state(), TransactionState::Aborted);
        assert_eq!(txn.snapshot_sequence(), None);

        let err = txn.put(b"k", b"v").unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(txn.get(b"k").unwrap_err().is_invalid_argument());
        assert!(txn.commit().unwrap_err().is_invalid_argument());
        // Abort of an aborted transaction is fine.
        txn.abort().unwrap();
    }

    #[test]
    fn snapshot_failure_starts_aborted() {
        let store = Arc::new(FlakyStore::default());
        store.fail_snapshots.store(true, Ordering::SeqCst);

        let txn = Transaction::begin(store.clone());
        assert_eq!(txn.state(), TransactionState::Aborted);
        assert_eq!(store.inner.live_snapshots(), 0);
    }

    #[test]
    fn store_closed_mid_transaction_fails_guard() {
        let store = store();
        let mut txn = Transaction::begin(store.clone());
        txn.put(b"k", b"v").unwrap();
        store.close();

        let err = txn.commit().unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidArgument { ref message } if message == "store is closed"
        ));
        // Guard failures never change state.
        assert!(txn.is_active());
        assert_eq!(txn.write_count(), 1);
    }

    #[test]
    fn read_your_own_write_ignores_store() {
        let store = store();
        put(&store, b"k", b"stored");

        let mut txn = Transaction::begin(store.clone());
        txn.put(b"k", b"mine").unwrap();

        assert_eq!(txn.get(b"k").unwrap(), Some(b"mine".to_vec()));
        assert_eq!(txn.read_count(), 0);
    }

    #[test]
    fn own_write_served_even_after_external_change() {
        let store = store();
        put(&store, b"k", b"A");

        let mut txn = Transaction::begin(store.clone());
        txn.put(b"k", b"mine").unwrap();
        put(&store, b"k", b"B");

        // No validation for buffered keys, so no conflict here.
        assert_eq!(txn.get(b"k").unwrap(), Some(b"mine".to_vec()));
        assert!(txn.is_active());
    }

    #[test]
    fn tombstone_hides_stored_value() {
        let store = store();
        put(&store, b"k", b"stored");

        let mut txn = Transaction::begin(store.clone());
        txn.delete(b"k").unwrap();

        assert_eq!(txn.get(b"k").unwrap(), None);
        assert!(txn.pending_write(b"k").unwrap().is_tombstone());
    }

    #[test]
    fn get_of_missing_key_is_none_and_recorded() {
        let store = store();
        let mut txn = Transaction::begin(store.clone());

        assert_eq!(txn.get(b"missing").unwrap(), None);
        assert_eq!(txn.read_count(), 1);
    }

    #[test]
    fn get_returns_committed_value() {
        let store = store();
        put(&store, b"k", b"v");

        let mut txn = Transaction::begin(store.clone());
        assert_eq!(txn.get(b"k").unwrap(), Some(b"v".to_vec()));
        assert_eq!(txn.read_count(), 1);
    }

    #[test]
    fn abort_is_idempotent() {
        let store = store();
        let mut txn = Transaction::begin(store.clone());
        txn.put(b"k", b"v").unwrap();

        txn.abort().unwrap();
        txn.abort().unwrap();
        assert_eq!(txn.state(), TransactionState::Aborted);
        assert_eq!(txn.write_count(), 0);
        assert_eq!(store.get(b"k", None).unwrap(), None);
    }

    #[test]
    fn cannot_abort_after_commit() {
        let store = store();
        let mut txn = Transaction::begin(store.clone());
        txn.commit().unwrap();

        let err = txn.abort().unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(txn.state(), TransactionState::Committed);
    }

    #[test]
    fn cannot_write_after_commit() {
        let store = store();
        let mut txn = Transaction::begin(store.clone());
        txn.commit().unwrap();

        let err = txn.put(b"k", b"v").unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidArgument { ref message } if message == "transaction has been committed"
        ));
    }

    #[test]
    fn cannot_write_after_abort() {
        let store = store();
        let mut txn = Transaction::begin(store.clone());
        txn.abort().unwrap();

        let err = txn.delete(b"k").unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidArgument { ref message } if message == "transaction has been aborted"
        ));
    }

    #[test]
    fn cannot_commit_twice() {
        let store = store();
        let mut txn = Transaction::begin(store.clone());
        txn.put(b"k", b"v").unwrap();
        txn.commit().unwrap();

        assert!(txn.commit().unwrap_err().is_invalid_argument());
    }

    #[test]
    fn read_only_commit_ignores_later_external_writes() {
        let store = store();
        put(&store, b"k", b"A");

        let mut txn = Transaction::begin(store.clone());
        assert_eq!(txn.get(b"k").unwrap(), Some(b"A".to_vec()));
        put(&store, b"k", b"B");

        txn.commit().unwrap();
        assert_eq!(txn.state(), TransactionState::Committed);
    }

    #[test]
    fn conflicting_read_aborts() {
        let store = store();
        put(&store, b"k", b"A");

        let mut txn = Transaction::begin(store.clone());
        txn.put(b"other", b"x").unwrap();
        put(&store, b"k", b"B");

        let err = txn.get(b"k").unwrap_err();
        assert_eq!(err.conflict_key(), Some(&b"k"[..]));
        assert_eq!(txn.state(), TransactionState::Aborted);
        assert_eq!(txn.write_count(), 0);
        assert_eq!(txn.read_count(), 0);
    }

    #[test]
    fn read_of_key_created_after_snapshot_conflicts() {
        let store = store();
        let mut txn = Transaction::begin(store.clone());
        put(&store, b"k", b"new");

        assert!(txn.get(b"k").unwrap_err().is_conflict());
        assert_eq!(txn.state(), TransactionState::Aborted);
    }

    #[test]
    fn write_write_conflict_at_commit() {
        let store = store();
        put(&store, b"k", b"A");

        let mut t1 = Transaction::begin(store.clone());
        t1.put(b"k", b"X").unwrap();

        let mut t2 = Transaction::begin(store.clone());
        t2.put(b"k", b"Y").unwrap();
        t2.commit().unwrap();

        let err = t1.commit().unwrap_err();
        assert_eq!(err.conflict_key(), Some(&b"k"[..]));
        assert_eq!(t1.state(), TransactionState::Aborted);
        assert_eq!(t1.write_count(), 0);
        assert_eq!(store.get(b"k", None).unwrap(), Some(b"Y".to_vec()));
    }

    #[test]
    fn read_set_revalidated_at_commit() {
        let store = store();
        put(&store, b"a", b"1");

        let mut txn = Transaction::begin(store.clone());
        assert_eq!(txn.get(b"a").unwrap(), Some(b"1".to_vec()));

        // Someone commits after our last read but before our commit.
        put(&store, b"a", b"2");
        txn.put(b"b", b"derived-from-1").unwrap();

        let err = txn.commit().unwrap_err();
        assert_eq!(err.conflict_key(), Some(&b"a"[..]));
        assert_eq!(store.get(b"b", None).unwrap(), None);
    }

    #[test]
    fn commit_applies_all_keys_in_one_batch() {
        let store = store();
        let before = store.latest_sequence();

        let mut txn = Transaction::begin(store.clone());
        txn.put(b"k1", b"1").unwrap();
        txn.put(b"k2", b"2").unwrap();
        txn.commit().unwrap();

        assert_eq!(store.latest_sequence(), before.next());
        assert_eq!(store.get(b"k1", None).unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.get(b"k2", None).unwrap(), Some(b"2".to_vec()));
        assert_eq!(txn.write_count(), 0);
    }

    #[test]
    fn put_then_delete_commits_as_delete() {
        let store = store();
        put(&store, b"k", b"old");

        let mut txn = Transaction::begin(store.clone());
        txn.put(b"k", b"new").unwrap();
        txn.delete(b"k").unwrap();
        txn.commit().unwrap();

        assert_eq!(store.get(b"k", None).unwrap(), None);
    }

    #[test]
    fn apply_failure_aborts_and_surfaces_store_error() {
        let store = Arc::new(FlakyStore::default());
        store.fail_writes.store(true, Ordering::SeqCst);

        let mut txn = Transaction::begin(store.clone());
        txn.put(b"k", b"v").unwrap();

        let err = txn.commit().unwrap_err();
        assert!(matches!(
            err,
            CoreError::Storage(StorageError::WriteRejected { ref reason }) if reason == "disk full"
        ));
        assert_eq!(txn.state(), TransactionState::Aborted);
        assert_eq!(store.inner.get(b"k", None).unwrap(), None);
    }

    #[test]
    fn store_error_on_get_keeps_transaction_active() {
        let store = Arc::new(FlakyStore::default());
        put(&store.inner, b"k", b"v");

        let mut txn = Transaction::begin(store.clone());
        store.fail_reads.store(true, Ordering::SeqCst);
        let err = txn.get(b"k").unwrap_err();
        assert!(matches!(
            err,
            CoreError::Storage(StorageError::Unavailable { ref reason }) if reason == "io"
        ));
        assert!(txn.is_active());
        assert_eq!(txn.read_count(), 0);

        // The read can be retried once the store recovers.
        store.fail_reads.store(false, Ordering::SeqCst);
        assert_eq!(txn.get(b"k").unwrap(), Some(b"v".to_vec()));
        txn.commit().unwrap();
    }

    #[test]
    fn store_error_during_commit_validation_aborts() {
        let store = Arc::new(FlakyStore::default());
        put(&store.inner, b"k", b"v");

        let mut txn = Transaction::begin(store.clone());
        assert_eq!(txn.get(b"k").unwrap(), Some(b"v".to_vec()));
        txn.put(b"other", b"x").unwrap();

        store.fail_reads.store(true, Ordering::SeqCst);
        let err = txn.commit().unwrap_err();
        assert!(matches!(
            err,
            CoreError::Storage(StorageError::Unavailable { .. })
        ));
        assert_eq!(txn.state(), TransactionState::Aborted);
        assert_eq!(txn.write_count(), 0);
        store.fail_reads.store(false, Ordering::SeqCst);

        drop(txn);
        assert_eq!(store.inner.live_snapshots(), 0);
        assert_eq!(store.inner.get(b"other", None).unwrap(), None);
    }

    #[test]
    fn sync_on_commit_reaches_store() {
        let store = Arc::new(FlakyStore::default());

        let mut txn = Transaction::begin_with_config(store.clone(), Config::new().sync_on_commit(true));
        txn.put(b"k", b"v").unwrap();
        txn.commit().unwrap();

        assert!(store.last_sync.load(Ordering::SeqCst));
    }

    #[test]
    fn stats_follow_lifecycle() {
        let store = store();
        let stats = Arc::new(TransactionStats::new());

        let mut ok = Transaction::start(store.clone(), Config::default(), Some(stats.clone()));
        ok.put(b"k", b"1").unwrap();
        ok.commit().unwrap();

        let mut reader = Transaction::start(store.clone(), Config::default(), Some(stats.clone()));
        reader.commit().unwrap();

        let mut loser = Transaction::start(store.clone(), Config::default(), Some(stats.clone()));
        put(&store, b"k", b"2");
        assert!(loser.get(b"k").is_err());

        let dropped = Transaction::start(store.clone(), Config::default(), Some(stats.clone()));
        drop(dropped);

        let snap = stats.snapshot();
        assert_eq!(snap.started, 4);
        assert_eq!(snap.committed, 2);
        assert_eq!(snap.read_only_commits, 1);
        assert_eq!(snap.aborted, 2);
        assert_eq!(snap.read_conflicts, 1);
        assert_eq!(snap.in_flight(), 0);
    }

    #[test]
    fn transaction_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Transaction>();
    }

    #[test]
    fn debug_shows_summary() {
        let store = store();
        let mut txn = Transaction::begin(store.clone());
        txn.put(b"k", b"v").unwrap();

        let debug = format!("{txn:?}");
        assert!(debug.contains("Active"));
        assert!(debug.contains("writes: 1"));
    }
}
