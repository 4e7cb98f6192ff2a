//! Property-based test generators using proptest.
//!
//! Keys are drawn from a deliberately small key space so that random
//! operation sequences keep revisiting the same keys: overwrites, deletes of
//! buffered puts and reads of tombstones all show up in short sequences.

use proptest::prelude::*;
use std::collections::BTreeMap;

/// Number of distinct keys produced by [`key_strategy`].
pub const KEY_SPACE: u8 = 8;

/// Returns the `index`-th key of the generated key space.
pub fn key_at(index: u8) -> Vec<u8> {
    format!("k{index}").into_bytes()
}

/// Strategy for generating keys from the shared key space.
pub fn key_strategy() -> impl Strategy<Value = Vec<u8>> {
    (0..KEY_SPACE).prop_map(key_at)
}

/// Strategy for generating values (arbitrary bytes, possibly empty).
pub fn value_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..64)
}

/// Strategy for generating the committed contents of a store before a test.
pub fn store_contents_strategy() -> impl Strategy<Value = BTreeMap<Vec<u8>, Vec<u8>>> {
    prop::collection::btree_map(key_strategy(), value_strategy(), 0..KEY_SPACE as usize)
}

/// A single transaction operation.
#[derive(Debug, Clone)]
pub enum TxnOperation {
    /// Buffer a write.
    Put {
        /// Key
        key: Vec<u8>,
        /// Value
        value: Vec<u8>,
    },
    /// Buffer a delete.
    Delete {
        /// Key
        key: Vec<u8>,
    },
    /// Read a key.
    Get {
        /// Key
        key: Vec<u8>,
    },
}

impl TxnOperation {
    /// Returns the key this operation touches.
    pub fn key(&self) -> &[u8] {
        match self {
            Self::Put { key, .. } | Self::Delete { key } | Self::Get { key } => key,
        }
    }
}

/// Strategy for generating transaction operations.
pub fn txn_operation_strategy() -> impl Strategy<Value = TxnOperation> {
    prop_oneof![
        3 => (key_strategy(), value_strategy())
            .prop_map(|(key, value)| TxnOperation::Put { key, value }),
        1 => key_strategy().prop_map(|key| TxnOperation::Delete { key }),
        2 => key_strategy().prop_map(|key| TxnOperation::Get { key }),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<TxnOperation>> {
    prop::collection::vec(txn_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::test_runner::TestCaseError;
    use std::sync::Arc;
    use txkv_core::{Transaction, TransactionState};
    use txkv_storage::{InMemoryStore, KvStore, WriteBatch, WriteOptions};

    fn seeded_store(contents: &BTreeMap<Vec<u8>, Vec<u8>>) -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        let mut batch = WriteBatch::new();
        for (key, value) in contents {
            batch.put(key, value);
        }
        store.write(&WriteOptions::default(), &batch).unwrap();
        store
    }

    /// Runs `ops` in a fresh transaction, checking every read against a
    /// model of the committed contents overlaid with the buffered writes.
    fn run_against_model(
        store: &Arc<InMemoryStore>,
        committed: &BTreeMap<Vec<u8>, Vec<u8>>,
        ops: &[TxnOperation],
    ) -> Result<(Transaction, BTreeMap<Vec<u8>, Vec<u8>>), TestCaseError> {
        let mut overlay = committed.clone();
        let mut txn = Transaction::begin(store.clone());

        for op in ops {
            match op {
                TxnOperation::Put { key, value } => {
                    txn.put(key, value).unwrap();
                    overlay.insert(key.clone(), value.clone());
                }
                TxnOperation::Delete { key } => {
                    txn.delete(key).unwrap();
                    overlay.remove(key);
                }
                TxnOperation::Get { key } => {
                    prop_assert_eq!(txn.get(key).unwrap(), overlay.get(key).cloned());
                }
            }
        }
        prop_assert!(txn.is_active());
        Ok((txn, overlay))
    }

    fn assert_store_matches(
        store: &InMemoryStore,
        expected: &BTreeMap<Vec<u8>, Vec<u8>>,
    ) -> Result<(), TestCaseError> {
        for index in 0..KEY_SPACE {
            let key = key_at(index);
            prop_assert_eq!(store.get(&key, None).unwrap(), expected.get(&key).cloned());
        }
        Ok(())
    }

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn keys_stay_in_key_space(key in key_strategy()) {
            prop_assert!((0..KEY_SPACE).any(|i| key_at(i) == key));
        }

        #[test]
        fn committed_transaction_matches_model(
            contents in store_contents_strategy(),
            ops in operation_sequence_strategy(1, 40),
        ) {
            let store = seeded_store(&contents);
            let (mut txn, overlay) = run_against_model(&store, &contents, &ops)?;

            txn.commit().unwrap();
            prop_assert_eq!(txn.state(), TransactionState::Committed);
            drop(txn);

            assert_store_matches(&store, &overlay)?;
            prop_assert_eq!(store.live_snapshots(), 0);
        }

        #[test]
        fn aborted_transaction_leaves_store_unchanged(
            contents in store_contents_strategy(),
            ops in operation_sequence_strategy(1, 40),
        ) {
            let store = seeded_store(&contents);
            let before = store.latest_sequence();
            let (mut txn, _) = run_against_model(&store, &contents, &ops)?;

            txn.abort().unwrap();
            prop_assert_eq!(txn.state(), TransactionState::Aborted);
            drop(txn);

            assert_store_matches(&store, &contents)?;
            prop_assert_eq!(store.latest_sequence(), before);
            prop_assert_eq!(store.live_snapshots(), 0);
        }

        #[test]
        fn dropped_transaction_leaves_store_unchanged(
            contents in store_contents_strategy(),
            ops in operation_sequence_strategy(1, 40),
        ) {
            let store = seeded_store(&contents);
            let (txn, _) = run_against_model(&store, &contents, &ops)?;
            drop(txn);

            assert_store_matches(&store, &contents)?;
            prop_assert_eq!(store.live_snapshots(), 0);
        }
    }
}
