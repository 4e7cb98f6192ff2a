//! Test fixtures and store helpers.
//!
//! Provides convenience functions for setting up test stores and common test
//! scenarios.

use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use txkv_core::{Config, TransactionDb};
use txkv_storage::InMemoryStore;

/// A test database: a [`TransactionDb`] plus direct access to its store.
pub struct TestDb {
    /// The transaction facade.
    pub db: TransactionDb,
    /// The store behind `db`, for inspection.
    pub store: Arc<InMemoryStore>,
}

impl TestDb {
    /// Creates an empty in-memory test database.
    pub fn memory() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates an empty in-memory test database with a custom configuration.
    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let db = TransactionDb::with_config(store.clone(), config);
        Self { db, store }
    }
}

impl std::ops::Deref for TestDb {
    type Target = TransactionDb;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

/// Installs a tracing subscriber for tests.
///
/// Honours `RUST_LOG` and falls back to `warn`. Safe to call from every test;
/// only the first call installs anything.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Runs a test with a fresh in-memory database.
///
/// # Example
///
/// ```rust
/// use txkv_testkit::with_test_db;
///
/// with_test_db(|db| {
///     db.transaction(|txn| txn.put(b"k", b"v")).unwrap();
///     assert_eq!(db.get(b"k").unwrap(), Some(b"v".to_vec()));
/// });
/// ```
pub fn with_test_db<F, R>(f: F) -> R
where
    F: FnOnce(&TestDb) -> R,
{
    init_tracing();
    let test_db = TestDb::memory();
    f(&test_db)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Key of the `index`-th account.
    pub fn account_key(index: usize) -> Vec<u8> {
        format!("account:{index:04}").into_bytes()
    }

    /// Encodes a balance.
    pub fn encode_balance(balance: u64) -> Vec<u8> {
        balance.to_le_bytes().to_vec()
    }

    /// Decodes a balance written by [`encode_balance`]. Missing or malformed
    /// values read as zero.
    pub fn decode_balance(bytes: Option<&[u8]>) -> u64 {
        bytes
            .and_then(|b| <[u8; 8]>::try_from(b).ok())
            .map(u64::from_le_bytes)
            .unwrap_or(0)
    }

    /// Creates a database holding `accounts` accounts of `balance` each,
    /// written in a single transaction.
    pub fn bank(accounts: usize, balance: u64) -> TestDb {
        let test_db = TestDb::memory();
        test_db
            .transaction(|txn| {
                for i in 0..accounts {
                    txn.put(&account_key(i), &encode_balance(balance))?;
                }
                Ok(())
            })
            .expect("Failed to seed accounts");
        test_db
    }

    /// Creates a database with `count` keys `key:N` -> `value:N`.
    pub fn populated(count: usize) -> TestDb {
        let test_db = TestDb::memory();
        test_db
            .transaction(|txn| {
                for i in 0..count {
                    txn.put(format!("key:{i}").as_bytes(), format!("value:{i}").as_bytes())?;
                }
                Ok(())
            })
            .expect("Failed to populate");
        test_db
    }
}
