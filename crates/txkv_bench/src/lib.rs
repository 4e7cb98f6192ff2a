//! Benchmark utilities.

use rand::Rng;
use std::sync::Arc;
use txkv_core::TransactionDb;
use txkv_storage::InMemoryStore;

/// Generate random value bytes of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Key of the `i`-th benchmark record.
pub fn bench_key(i: usize) -> Vec<u8> {
    format!("bench:{i:08}").into_bytes()
}

/// Generate `count` keys with random values of `value_size` bytes.
pub fn generate_records(count: usize, value_size: usize) -> Vec<(Vec<u8>, Vec<u8>)> {
    (0..count)
        .map(|i| (bench_key(i), random_data(value_size)))
        .collect()
}

/// Creates a database whose store already holds `records`.
pub fn populated_db(records: &[(Vec<u8>, Vec<u8>)]) -> (Arc<InMemoryStore>, TransactionDb) {
    let store = Arc::new(InMemoryStore::new());
    let db = TransactionDb::new(store.clone());
    db.transaction(|txn| {
        for (key, value) in records {
            txn.put(key, value)?;
        }
        Ok(())
    })
    .expect("Failed to populate benchmark store");
    (store, db)
}
