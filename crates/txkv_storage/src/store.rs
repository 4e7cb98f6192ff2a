//! Key-value store trait definition.

use crate::batch::{WriteBatch, WriteOptions};
use crate::error::StorageResult;
use crate::snapshot::Snapshot;

/// A single-node key-value store that txkv transactions are layered on.
///
/// Stores expose only single-key reads and single-batch atomic writes; the
/// transaction layer builds multi-key snapshot isolation out of these.
///
/// # Invariants
///
/// - A snapshot observes every batch applied before it was taken and none
///   applied after
/// - `write` applies a whole batch or nothing, and a reader never observes a
///   partially applied batch
/// - Every snapshot handed out by `snapshot` is released at most once (the
///   token is moved into `release_snapshot`)
/// - Stores must be `Send + Sync`; all methods take `&self` and are safe to
///   call concurrently
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - Multi-version in-memory store
pub trait KvStore: Send + Sync {
    /// Takes a snapshot of the latest committed state.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is closed or cannot pin a snapshot.
    fn snapshot(&self) -> StorageResult<Snapshot>;

    /// Releases a snapshot previously returned by [`KvStore::snapshot`].
    ///
    /// After release the store may discard versions only that snapshot could
    /// see.
    fn release_snapshot(&self, snapshot: Snapshot);

    /// Reads a single key.
    ///
    /// With `Some(snapshot)` the read is pinned to that snapshot; with `None`
    /// it observes the latest committed state. Returns `Ok(None)` if the key
    /// does not exist in that view.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is closed or the snapshot is unknown.
    fn get(&self, key: &[u8], snapshot: Option<&Snapshot>) -> StorageResult<Option<Vec<u8>>>;

    /// Applies a batch atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch could not be applied; in that case none
    /// of its operations are visible.
    fn write(&self, options: &WriteOptions, batch: &WriteBatch) -> StorageResult<()>;

    /// Returns true if the store no longer accepts operations.
    fn is_closed(&self) -> bool {
        false
    }
}
