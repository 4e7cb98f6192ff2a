//! Snapshot tokens and commit sequence numbers.

use std::fmt;

/// Sequence number for ordering commits.
///
/// Every applied write batch gets the next sequence number. A snapshot pins
/// one sequence number and sees exactly the batches at or below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SequenceNumber(pub u64);

impl SequenceNumber {
    /// Creates a new sequence number.
    #[must_use]
    pub const fn new(seq: u64) -> Self {
        Self(seq)
    }

    /// Returns the raw sequence value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the next sequence number.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seq:{}", self.0)
    }
}

/// Identifier of a live snapshot within its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotId(pub u64);

impl SnapshotId {
    /// Creates a new snapshot ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "snap:{}", self.0)
    }
}

/// A point-in-time view of a store.
///
/// Snapshots are handed out by [`crate::KvStore::snapshot`] and must be given
/// back with [`crate::KvStore::release_snapshot`]. The token is deliberately
/// not `Clone`: releasing consumes it, so a snapshot cannot be released twice.
#[derive(Debug, PartialEq, Eq)]
pub struct Snapshot {
    id: SnapshotId,
    sequence: SequenceNumber,
}

impl Snapshot {
    /// Creates a snapshot token.
    ///
    /// Only store implementations should call this; the store is responsible
    /// for tracking the token until it is released.
    #[must_use]
    pub const fn new(id: SnapshotId, sequence: SequenceNumber) -> Self {
        Self { id, sequence }
    }

    /// Returns the snapshot's ID.
    #[must_use]
    pub const fn id(&self) -> SnapshotId {
        self.id
    }

    /// Returns the sequence number this snapshot is pinned to.
    #[must_use]
    pub const fn sequence(&self) -> SequenceNumber {
        self.sequence
    }
}
