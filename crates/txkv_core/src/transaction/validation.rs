//! Snapshot-isolation validation.
//!
//! One check is used everywhere a transaction needs to know whether its view
//! of a key is still current: on every `get` that reaches the store, and at
//! commit for every key in the read set and the write set. The write-set pass
//! is what gives first-committer-wins: a key we are about to overwrite must
//! not have been changed by anyone else since our snapshot.

use crate::error::{CoreError, CoreResult};
use tracing::trace;
use txkv_storage::{KvStore, Snapshot};

/// Checks that `key` reads the same through `snapshot` as it does now.
///
/// Returns the current value (`None` if the key does not exist) when the two
/// views agree, and [`CoreError::Conflict`] when the key was added, removed or
/// changed since the snapshot was taken.
///
/// # Errors
///
/// Returns a conflict as described above, or the store's error if either read
/// fails.
pub(crate) fn validate_snapshot_isolation(
    store: &dyn KvStore,
    snapshot: &Snapshot,
    key: &[u8],
) -> CoreResult<Option<Vec<u8>>> {
    let at_snapshot = store.get(key, Some(snapshot))?;
    let current = store.get(key, None)?;

    if at_snapshot != current {
        trace!(
            key_len = key.len(),
            existed_at_snapshot = at_snapshot.is_some(),
            exists_now = current.is_some(),
            snapshot = %snapshot.sequence(),
            "snapshot validation failed"
        );
        return Err(CoreError::conflict(key));
    }

    Ok(current)
}
