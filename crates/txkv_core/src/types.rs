//! Core type definitions for txkv.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TXID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a transaction.
///
/// Transaction IDs are monotonically increasing within a process and never
/// reused. They exist for logging and diagnostics only; they play no part in
/// conflict detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(pub u64);

impl TransactionId {
    /// Creates a new transaction ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates the next process-wide transaction ID.
    #[must_use]
    pub(crate) fn next() -> Self {
        Self(NEXT_TXID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_increase() {
        let a = TransactionId::next();
        let b = TransactionId::next();
        assert!(b > a);
    }

    #[test]
    fn display() {
        assert_eq!(TransactionId::new(12).to_string(), "txn:12");
    }
}
