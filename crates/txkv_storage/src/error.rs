//! Error types for store operations.

use thiserror::Error;

/// Result type for store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The store is closed.
    #[error("store is closed")]
    Closed,

    /// A snapshot that this store does not know about was used.
    ///
    /// Either it was taken from a different store or it has already been
    /// released.
    #[error("unknown snapshot: {id}")]
    UnknownSnapshot {
        /// Id of the offending snapshot.
        id: u64,
    },

    /// The store refused to apply a write batch.
    #[error("write rejected: {reason}")]
    WriteRejected {
        /// Why the write was refused.
        reason: String,
    },

    /// The store could not serve a read or a snapshot.
    #[error("store unavailable: {reason}")]
    Unavailable {
        /// Why the request failed.
        reason: String,
    },
}

impl StorageError {
    /// Creates a write rejected error.
    pub fn write_rejected(reason: impl Into<String>) -> Self {
        Self::WriteRejected {
            reason: reason.into(),
        }
    }

    /// Creates an unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }
}
