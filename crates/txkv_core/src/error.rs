//! Error types for txkv core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in txkv transaction operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Error reported by the underlying store, passed through unchanged.
    #[error("storage error: {0}")]
    Storage(#[from] txkv_storage::StorageError),

    /// Operation not permitted in the transaction's current state.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Which precondition failed.
        message: String,
    },

    /// The key changed in the store after the transaction's snapshot was taken.
    #[error("transaction conflict on key {}", String::from_utf8_lossy(.key))]
    Conflict {
        /// The key that conflicted.
        key: Vec<u8>,
    },
}

impl CoreError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a conflict error for `key`.
    pub fn conflict(key: &[u8]) -> Self {
        Self::Conflict { key: key.to_vec() }
    }

    /// Returns true for a read-write or write-write conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Returns true for a precondition violation.
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }

    /// Returns the conflicting key, if this is a conflict.
    #[must_use]
    pub fn conflict_key(&self) -> Option<&[u8]> {
        match self {
            Self::Conflict { key } => Some(key),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use txkv_storage::StorageError;

    #[test]
    fn conflict_display_shows_key() {
        let err = CoreError::conflict(b"account:7");
        assert_eq!(err.to_string(), "transaction conflict on key account:7");
        assert!(err.is_conflict());
        assert_eq!(err.conflict_key(), Some(&b"account:7"[..]));
    }

    #[test]
    fn storage_error_converts() {
        let err: CoreError = StorageError::Closed.into();
        assert!(matches!(err, CoreError::Storage(StorageError::Closed)));
        assert!(!err.is_conflict());
        assert_eq!(err.conflict_key(), None);
    }

    #[test]
    fn invalid_argument_message() {
        let err = CoreError::invalid_argument("transaction has been aborted");
        assert!(err.is_invalid_argument());
        assert_eq!(
            err.to_string(),
            "invalid argument: transaction has been aborted"
        );
    }
}
