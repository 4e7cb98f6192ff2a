//! # txkv Storage
//!
//! The key-value store that txkv transactions run on top of.
//!
//! This crate is the lowest layer of txkv. A store only knows how to do four
//! things, and the transaction layer in `txkv_core` is built entirely from them:
//!
//! - take a point-in-time [`Snapshot`]
//! - release a snapshot
//! - read a single key, optionally pinned to a snapshot
//! - apply a [`WriteBatch`] atomically
//!
//! ## Design Principles
//!
//! - Stores are single-node and must be `Send + Sync`
//! - A batch becomes visible all at once or not at all
//! - Stores own snapshot lifetime accounting and old-version cleanup
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - Multi-version in-memory store for tests and ephemeral data
//!
//! ## Example
//!
//! ```rust
//! use txkv_storage::{InMemoryStore, KvStore, WriteBatch, WriteOptions};
//!
//! let store = InMemoryStore::new();
//! let mut batch = WriteBatch::new();
//! batch.put(b"hello", b"world");
//! store.write(&WriteOptions::default(), &batch).unwrap();
//!
//! assert_eq!(store.get(b"hello", None).unwrap(), Some(b"world".to_vec()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod batch;
mod error;
mod memory;
mod snapshot;
mod store;

pub use batch::{BatchOp, WriteBatch, WriteOptions};
pub use error::{StorageError, StorageResult};
pub use memory::InMemoryStore;
pub use snapshot::{SequenceNumber, Snapshot, SnapshotId};
pub use store::KvStore;
