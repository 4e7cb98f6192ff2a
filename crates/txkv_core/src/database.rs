//! Transaction facade over a store.

use crate::config::Config;
use crate::error::CoreResult;
use crate::stats::TransactionStats;
use crate::transaction::Transaction;
use std::sync::Arc;
use txkv_storage::KvStore;

/// A store plus the configuration and statistics its transactions share.
///
/// `TransactionDb` is cheap to share behind an `Arc`; every transaction it
/// begins holds its own reference to the store.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use txkv_core::TransactionDb;
/// use txkv_storage::InMemoryStore;
///
/// let db = TransactionDb::new(Arc::new(InMemoryStore::new()));
///
/// db.transaction(|txn| {
///     txn.put(b"alice", b"100")?;
///     txn.put(b"bob", b"50")?;
///     Ok(())
/// })
/// .unwrap();
///
/// assert_eq!(db.get(b"bob").unwrap(), Some(b"50".to_vec()));
/// ```
pub struct TransactionDb {
    store: Arc<dyn KvStore>,
    config: Config,
    stats: Arc<TransactionStats>,
}

impl TransactionDb {
    /// Creates a facade with the default configuration.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self::with_config(store, Config::default())
    }

    /// Creates a facade with a custom configuration.
    pub fn with_config(store: Arc<dyn KvStore>, config: Config) -> Self {
        Self {
            store,
            config,
            stats: Arc::new(TransactionStats::new()),
        }
    }

    /// Begins a new transaction.
    ///
    /// Like [`Transaction::begin`] this never fails; a closed store yields an
    /// already aborted transaction.
    pub fn begin(&self) -> Transaction {
        let stats = self
            .config
            .collect_stats
            .then(|| Arc::clone(&self.stats));
        Transaction::start(Arc::clone(&self.store), self.config.clone(), stats)
    }

    /// Executes a function within a transaction.
    ///
    /// If the function returns `Ok`, the transaction is committed and the
    /// commit's outcome is returned. If it returns `Err`, the transaction is
    /// aborted and the function's error is returned. Conflicts are not
    /// retried; run the closure again to retry with a fresh snapshot.
    pub fn transaction<F, T>(&self, f: F) -> CoreResult<T>
    where
        F: FnOnce(&mut Transaction) -> CoreResult<T>,
    {
        let mut txn = self.begin();
        match f(&mut txn) {
            Ok(result) => {
                txn.commit()?;
                Ok(result)
            }
            Err(e) => {
                // Try to abort, but don't mask the original error
                let _ = txn.abort();
                Err(e)
            }
        }
    }

    /// Reads the latest committed value of a key, outside any transaction.
    pub fn get(&self, key: &[u8]) -> CoreResult<Option<Vec<u8>>> {
        Ok(self.store.get(key, None)?)
    }

    /// Returns the shared statistics.
    #[must_use]
    pub fn stats(&self) -> &TransactionStats {
        &self.stats
    }

    /// Returns the configuration given to new transactions.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }
}

impl std::fmt::Debug for TransactionDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionDb")
            .field("config", &self.config)
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}
