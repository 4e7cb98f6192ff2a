//! In-memory multi-version store.

use crate::batch::{BatchOp, WriteBatch, WriteOptions};
use crate::error::{StorageError, StorageResult};
use crate::snapshot::{SequenceNumber, Snapshot, SnapshotId};
use crate::store::KvStore;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, trace};

/// One committed state of a key. `None` is a committed delete.
#[derive(Debug, Clone)]
struct Version {
    sequence: SequenceNumber,
    value: Option<Vec<u8>>,
}

#[derive(Debug, Default)]
struct Inner {
    /// key -> versions in ascending sequence order
    versions: HashMap<Vec<u8>, Vec<Version>>,
    last_sequence: SequenceNumber,
    next_snapshot_id: u64,
    /// live snapshot id -> pinned sequence
    snapshots: HashMap<SnapshotId, SequenceNumber>,
    /// pinned sequence -> number of live snapshots holding it
    pinned: BTreeMap<SequenceNumber, usize>,
    /// keys retaining more than one version
    history: HashSet<Vec<u8>>,
    closed: bool,
}

impl Inner {
    fn visible(&self, key: &[u8], at: SequenceNumber) -> Option<&Vec<u8>> {
        self.versions
            .get(key)?
            .iter()
            .rev()
            .find(|v| v.sequence <= at)?
            .value
            .as_ref()
    }

    /// Prunes one key and keeps `history` in step. Returns versions removed.
    fn prune_key(&mut self, key: &[u8]) -> usize {
        let Some(versions) = self.versions.get_mut(key) else {
            self.history.remove(key);
            return 0;
        };
        let before = versions.len();
        prune_versions(versions, &self.pinned);
        let after = versions.len();

        if after == 0 {
            self.versions.remove(key);
        }
        if after > 1 {
            if !self.history.contains(key) {
                self.history.insert(key.to_vec());
            }
        } else {
            self.history.remove(key);
        }
        before - after
    }

    /// Prunes only the keys that still hold old versions.
    fn prune_history(&mut self) -> usize {
        let keys: Vec<Vec<u8>> = self.history.drain().collect();
        keys.iter().map(|key| self.prune_key(key)).sum()
    }

    fn prune_all(&mut self) -> usize {
        let pinned = &self.pinned;
        let before: usize = self.versions.values().map(Vec::len).sum();
        self.versions.retain(|_, versions| {
            prune_versions(versions, pinned);
            !versions.is_empty()
        });
        let after: usize = self.versions.values().map(Vec::len).sum();
        self.history = self
            .versions
            .iter()
            .filter(|(_, versions)| versions.len() > 1)
            .map(|(key, _)| key.clone())
            .collect();
        before - after
    }
}

/// Drops versions that neither a pinned snapshot nor a latest read can observe.
///
/// A version is observable by snapshot `p` when it is the newest version at or
/// below `p`, i.e. `version.sequence <= p < next.sequence`. The newest version
/// always serves latest reads.
fn prune_versions(versions: &mut Vec<Version>, pinned: &BTreeMap<SequenceNumber, usize>) {
    let next_sequences: Vec<Option<SequenceNumber>> = versions
        .iter()
        .skip(1)
        .map(|v| Some(v.sequence))
        .chain(std::iter::once(None))
        .collect();
    let mut next_sequences = next_sequences.into_iter();

    versions.retain(|v| match next_sequences.next().flatten() {
        None => true,
        Some(next) => pinned.range(v.sequence..next).next().is_some(),
    });

    // A lone tombstone reads the same as a missing key.
    if versions.len() == 1 && versions[0].value.is_none() {
        versions.clear();
    }
}

/// A multi-version in-memory key-value store.
///
/// Every applied batch is stamped with a fresh [`SequenceNumber`] and all of
/// its operations become visible at that sequence, which is what makes batch
/// application atomic to readers. Snapshots pin a sequence; versions that no
/// live snapshot can observe are pruned when keys are rewritten and when a
/// snapshot is released. A release only revisits keys that still hold more
/// than one version; [`InMemoryStore::compact`] sweeps every key.
///
/// # Thread Safety
///
/// All state sits behind a single `RwLock`, so the store can be shared across
/// threads through an `Arc`.
///
/// # Example
///
/// ```rust
/// use txkv_storage::{InMemoryStore, KvStore, WriteBatch, WriteOptions};
///
/// let store = InMemoryStore::new();
/// let snap = store.snapshot().unwrap();
///
/// let mut batch = WriteBatch::new();
/// batch.put(b"k", b"v");
/// store.write(&WriteOptions::default(), &batch).unwrap();
///
/// // The snapshot predates the write.
/// assert_eq!(store.get(b"k", Some(&snap)).unwrap(), None);
/// assert_eq!(store.get(b"k", None).unwrap(), Some(b"v".to_vec()));
/// store.release_snapshot(snap);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Closes the store. Every later operation fails with [`StorageError::Closed`].
    ///
    /// Snapshots may still be released after close.
    pub fn close(&self) {
        self.inner.write().closed = true;
        debug!("in-memory store closed");
    }

    /// Returns the sequence number of the last applied batch.
    #[must_use]
    pub fn latest_sequence(&self) -> SequenceNumber {
        self.inner.read().last_sequence
    }

    /// Returns the number of snapshots that have not been released.
    #[must_use]
    pub fn live_snapshots(&self) -> usize {
        self.inner.read().snapshots.len()
    }

    /// Returns the number of retained versions across all keys.
    ///
    /// Useful for checking that old versions are cleaned up.
    #[must_use]
    pub fn version_count(&self) -> usize {
        self.inner.read().versions.values().map(Vec::len).sum()
    }

    /// Returns the number of keys visible in the latest state.
    #[must_use]
    pub fn key_count(&self) -> usize {
        let inner = self.inner.read();
        let at = inner.last_sequence;
        inner
            .versions
            .keys()
            .filter(|key| inner.visible(key, at).is_some())
            .count()
    }

    /// Drops every version no live snapshot can observe.
    ///
    /// Returns the number of versions removed.
    pub fn compact(&self) -> usize {
        let removed = self.inner.write().prune_all();
        trace!(removed, "compacted in-memory store");
        removed
    }
}

impl KvStore for InMemoryStore {
    fn snapshot(&self) -> StorageResult<Snapshot> {
        let mut inner = self.inner.write();
        if inner.closed {
            return Err(StorageError::Closed);
        }

        inner.next_snapshot_id += 1;
        let id = SnapshotId::new(inner.next_snapshot_id);
        let sequence = inner.last_sequence;
        inner.snapshots.insert(id, sequence);
        *inner.pinned.entry(sequence).or_insert(0) += 1;

        trace!(snapshot = %id, %sequence, "snapshot acquired");
        Ok(Snapshot::new(id, sequence))
    }

    fn release_snapshot(&self, snapshot: Snapshot) {
        let mut inner = self.inner.write();
        let Some(sequence) = inner.snapshots.remove(&snapshot.id()) else {
            debug!(snapshot = %snapshot.id(), "release of unknown snapshot ignored");
            return;
        };

        let last_holder = match inner.pinned.get_mut(&sequence) {
            Some(count) => {
                *count -= 1;
                *count == 0
            }
            None => false,
        };

        trace!(snapshot = %snapshot.id(), %sequence, "snapshot released");

        if last_holder {
            inner.pinned.remove(&sequence);
            let removed = inner.prune_history();
            if removed > 0 {
                trace!(removed, "pruned versions after snapshot release");
            }
        }
    }

    fn get(&self, key: &[u8], snapshot: Option<&Snapshot>) -> StorageResult<Option<Vec<u8>>> {
        let inner = self.inner.read();
        if inner.closed {
            return Err(StorageError::Closed);
        }

        let at = match snapshot {
            Some(snap) => match inner.snapshots.get(&snap.id()) {
                Some(&pinned) if pinned == snap.sequence() => pinned,
                _ => {
                    return Err(StorageError::UnknownSnapshot {
                        id: snap.id().as_u64(),
                    })
                }
            },
            None => inner.last_sequence,
        };

        Ok(inner.visible(key, at).cloned())
    }

    fn write(&self, options: &WriteOptions, batch: &WriteBatch) -> StorageResult<()> {
        let mut guard = self.inner.write();
        if guard.closed {
            return Err(StorageError::Closed);
        }
        if batch.is_empty() {
            return Ok(());
        }

        let inner = &mut *guard;
        let sequence = inner.last_sequence.next();

        for op in batch {
            let (key, value) = match op {
                BatchOp::Put { key, value } => (key, Some(value.clone())),
                BatchOp::Delete { key } => (key, None),
            };
            let versions = inner.versions.entry(key.clone()).or_default();
            match versions.last_mut() {
                // Same key twice in one batch: the later op wins.
                Some(last) if last.sequence == sequence => last.value = value,
                _ => versions.push(Version { sequence, value }),
            }
        }
        inner.last_sequence = sequence;

        for op in batch {
            inner.prune_key(op.key());
        }

        trace!(
            %sequence,
            ops = batch.len(),
            bytes = batch.approximate_size(),
            sync = options.sync,
            "batch applied"
        );
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.inner.read().closed
    }
}
