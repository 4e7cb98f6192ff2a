//! # txkv Core
//!
//! Multi-key transactions for single-node key-value stores.
//!
//! This crate provides:
//! - [`Transaction`]: snapshot reads, buffered writes, optimistic validation
//! - A process-wide commit lock that makes validate-then-apply atomic
//! - [`TransactionDb`]: a small facade with a closure-based transaction API
//! - [`TransactionStats`]: commit, abort and conflict counters
//!
//! The store itself is anything implementing [`txkv_storage::KvStore`].

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod database;
mod error;
mod stats;
mod transaction;
mod types;

pub use config::Config;
pub use database::TransactionDb;
pub use error::{CoreError, CoreResult};
pub use stats::{StatsSnapshot, TransactionStats};
pub use transaction::{BufferEntry, Transaction, TransactionState};
pub use types::TransactionId;
