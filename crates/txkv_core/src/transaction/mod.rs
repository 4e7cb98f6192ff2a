//! Snapshot-isolated transactions with optimistic validation.
//!
//! txkv transactions provide:
//! - **Atomicity**: a commit's writes reach the store as one batch
//! - **Isolation**: snapshot isolation, with every store read validated
//!   against the latest committed state
//! - **First-committer-wins**: a commit fails if any key it read or wrote
//!   changed since its snapshot
//!
//! Durability is whatever the underlying store provides.

mod serializer;
mod state;
mod txn;
mod validation;

pub use state::{BufferEntry, TransactionState};
pub use txn::Transaction;
