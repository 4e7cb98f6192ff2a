//! Fault injection.
//!
//! [`FaultyStore`] wraps an [`InMemoryStore`] and can be told to fail reads,
//! reject write batches or refuse snapshots. Writes can also fail after a
//! number of successful ones. It counts what passes through it so tests can
//! assert on how many times a transaction actually touched the store.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::debug;
use txkv_storage::{
    InMemoryStore, KvStore, Snapshot, StorageError, StorageResult, WriteBatch, WriteOptions,
};

const UNLIMITED: usize = usize::MAX;

/// A store that fails on demand.
#[derive(Debug)]
pub struct FaultyStore {
    inner: InMemoryStore,
    fail_writes: AtomicBool,
    fail_snapshots: AtomicBool,
    fail_reads: AtomicBool,
    writes_left: AtomicUsize,
    writes: AtomicUsize,
    rejected_writes: AtomicUsize,
    reads: AtomicUsize,
    last_sync: AtomicBool,
}

impl Default for FaultyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FaultyStore {
    /// Creates a store that does not fail until told to.
    pub fn new() -> Self {
        Self {
            inner: InMemoryStore::new(),
            fail_writes: AtomicBool::new(false),
            fail_snapshots: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
            writes_left: AtomicUsize::new(UNLIMITED),
            writes: AtomicUsize::new(0),
            rejected_writes: AtomicUsize::new(0),
            reads: AtomicUsize::new(0),
            last_sync: AtomicBool::new(false),
        }
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &InMemoryStore {
        &self.inner
    }

    /// Rejects every write batch while `fail` is set.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Rejects every snapshot request while `fail` is set.
    pub fn fail_snapshots(&self, fail: bool) {
        self.fail_snapshots.store(fail, Ordering::SeqCst);
    }

    /// Fails every point read while `fail` is set.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Lets `count` more write batches through, then rejects the rest.
    pub fn fail_writes_after(&self, count: usize) {
        self.writes_left.store(count, Ordering::SeqCst);
    }

    /// Clears every injected fault. Counters are kept.
    pub fn heal(&self) {
        self.fail_writes(false);
        self.fail_snapshots(false);
        self.fail_reads(false);
        self.writes_left.store(UNLIMITED, Ordering::SeqCst);
    }

    /// Number of write batches applied.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of write batches rejected.
    pub fn rejected_writes(&self) -> usize {
        self.rejected_writes.load(Ordering::SeqCst)
    }

    /// Number of point reads requested, failed ones included.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// The `sync` flag of the most recent write request.
    pub fn last_sync(&self) -> bool {
        self.last_sync.load(Ordering::SeqCst)
    }

    fn take_write_budget(&self) -> bool {
        self.writes_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                UNLIMITED => Some(UNLIMITED),
                0 => None,
                n => Some(n - 1),
            })
            .is_ok()
    }
}

impl KvStore for FaultyStore {
    fn snapshot(&self) -> StorageResult<Snapshot> {
        if self.fail_snapshots.load(Ordering::SeqCst) {
            debug!("injected snapshot failure");
            return Err(StorageError::unavailable("injected snapshot failure"));
        }
        self.inner.snapshot()
    }

    fn release_snapshot(&self, snapshot: Snapshot) {
        self.inner.release_snapshot(snapshot);
    }

    fn get(&self, key: &[u8], snapshot: Option<&Snapshot>) -> StorageResult<Option<Vec<u8>>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            debug!(key_len = key.len(), "injected read failure");
            return Err(StorageError::unavailable("injected read failure"));
        }
        self.inner.get(key, snapshot)
    }

    fn write(&self, options: &WriteOptions, batch: &WriteBatch) -> StorageResult<()> {
        self.last_sync.store(options.sync, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) || !self.take_write_budget() {
            self.rejected_writes.fetch_add(1, Ordering::SeqCst);
            debug!(ops = batch.len(), "injected write failure");
            return Err(StorageError::write_rejected("injected write failure"));
        }
        self.inner.write(options, batch)?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}
