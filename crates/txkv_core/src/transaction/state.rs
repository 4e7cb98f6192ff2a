//! Transaction state and buffered writes.

use std::collections::{HashMap, HashSet};
use std::fmt;
use txkv_storage::WriteBatch;

/// State of a transaction.
///
/// Transitions only go from `Active` to one of the two terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is active and can perform operations.
    Active,
    /// Transaction has been committed.
    Committed,
    /// Transaction has been aborted.
    Aborted,
}

impl TransactionState {
    /// Returns true for `Committed` and `Aborted`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Active => "active",
            Self::Committed => "committed",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// The pending state of one key, as written by a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferEntry {
    /// The key will hold this value.
    Value(Vec<u8>),
    /// The key will be deleted.
    Tombstone,
}

impl BufferEntry {
    /// Returns true for a pending delete.
    #[must_use]
    pub fn is_tombstone(&self) -> bool {
        matches!(self, Self::Tombstone)
    }

    /// Returns the pending value, or `None` for a tombstone.
    #[must_use]
    pub fn value(&self) -> Option<&[u8]> {
        match self {
            Self::Value(value) => Some(value),
            Self::Tombstone => None,
        }
    }
}

/// Keys read through the snapshot, re-validated at commit.
pub(crate) type ReadSet = HashSet<Vec<u8>>;

/// Writes buffered by a transaction.
///
/// Holds one entry per key for read-your-own-writes and validation, plus the
/// batch that is handed to the store at commit. Both are always cleared
/// together.
#[derive(Debug, Default)]
pub(crate) struct WriteBuffer {
    entries: HashMap<Vec<u8>, BufferEntry>,
    batch: WriteBatch,
}

impl WriteBuffer {
    pub(crate) fn put(&mut self, key: &[u8], value: &[u8]) {
        self.entries
            .insert(key.to_vec(), BufferEntry::Value(value.to_vec()));
        self.batch.put(key, value);
    }

    pub(crate) fn delete(&mut self, key: &[u8]) {
        self.entries.insert(key.to_vec(), BufferEntry::Tombstone);
        self.batch.delete(key);
    }

    pub(crate) fn get(&self, key: &[u8]) -> Option<&BufferEntry> {
        self.entries.get(key)
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.entries.keys().map(Vec::as_slice)
    }

    /// Number of distinct keys written.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn batch(&self) -> &WriteBatch {
        &self.batch
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.batch.clear();
    }
}
