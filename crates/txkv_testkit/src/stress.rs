//! Stress tests for txkv.
//!
//! These run many transactions against a [`TransactionDb`], some of them from
//! several threads at once, and check the invariants optimistic concurrency
//! control is meant to keep: no lost updates and no torn reads.

use crate::fixtures::scenarios::{account_key, decode_balance, encode_balance};
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;
use txkv_core::{CoreError, CoreResult, TransactionDb};

/// Starting balance of every account in [`stress_concurrent_transfers`].
pub const INITIAL_BALANCE: u64 = 1_000;

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations, conflicts included.
    pub failed_ops: usize,
    /// Times a transaction observed a broken invariant.
    pub violations: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            violations: 0,
            duration,
            ops_per_second,
        }
    }

    /// Sets the number of invariant violations seen.
    #[must_use]
    pub fn with_violations(mut self, violations: usize) -> Self {
        self.violations = violations;
        self
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Violations: {}", self.violations);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations to perform, split across threads.
    pub operations: usize,
    /// Number of concurrent threads (for concurrent tests).
    pub threads: usize,
    /// Size of written values in bytes.
    pub value_size: usize,
    /// Number of distinct keys.
    pub key_count: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 10_000,
            threads: 4,
            value_size: 256,
            key_count: 1_000,
        }
    }
}

impl StressConfig {
    fn ops_per_thread(&self) -> usize {
        self.operations / self.threads.max(1)
    }
}

fn stress_key(i: usize) -> Vec<u8> {
    format!("stress:{i:06}").into_bytes()
}

/// Adds one to the counter stored under `key` in a single transaction.
///
/// Returns the new value.
///
/// # Errors
///
/// Returns a conflict if another transaction changed the counter since this
/// one's snapshot, or any other error from the store.
pub fn increment(db: &TransactionDb, key: &[u8]) -> CoreResult<u64> {
    db.transaction(|txn| {
        let next = decode_balance(txn.get(key)?.as_deref()) + 1;
        txn.put(key, &encode_balance(next))?;
        Ok(next)
    })
}

/// Moves `amount` from account `from` to account `to`.
///
/// Returns `false` without writing anything if `from` cannot cover it.
///
/// # Errors
///
/// Returns a conflict if either account changed under the transaction, or
/// any other error from the store.
pub fn transfer(db: &TransactionDb, from: usize, to: usize, amount: u64) -> CoreResult<bool> {
    db.transaction(|txn| {
        let from_key = account_key(from);
        let to_key = account_key(to);
        let from_balance = decode_balance(txn.get(&from_key)?.as_deref());
        if from_balance < amount {
            return Ok(false);
        }
        let to_balance = decode_balance(txn.get(&to_key)?.as_deref());
        txn.put(&from_key, &encode_balance(from_balance - amount))?;
        txn.put(&to_key, &encode_balance(to_balance + amount))?;
        Ok(true)
    })
}

/// Sums every account balance inside one transaction.
///
/// # Errors
///
/// Returns a conflict if an account changed between the snapshot and its
/// read.
pub fn audit_total(db: &TransactionDb, accounts: usize) -> CoreResult<u64> {
    db.transaction(|txn| {
        let mut total = 0;
        for i in 0..accounts {
            total += decode_balance(txn.get(&account_key(i))?.as_deref());
        }
        Ok(total)
    })
}

/// Writes `accounts` accounts holding [`INITIAL_BALANCE`] each.
///
/// # Errors
///
/// Returns any error from the commit.
pub fn seed_accounts(db: &TransactionDb, accounts: usize) -> CoreResult<()> {
    db.transaction(|txn| {
        for i in 0..accounts {
            txn.put(&account_key(i), &encode_balance(INITIAL_BALANCE))?;
        }
        Ok(())
    })
}

/// Run a sequential write stress test.
pub fn stress_sequential_writes(db: &TransactionDb, config: &StressConfig) -> StressTestResult {
    let value = vec![0xABu8; config.value_size];

    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        let key = stress_key(i % config.key_count);
        match db.transaction(|txn| txn.put(&key, &value)) {
            Ok(()) => successful += 1,
            Err(_) => failed += 1,
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Run a mixed read/write/delete stress test, one operation per transaction.
pub fn stress_mixed_operations(db: &TransactionDb, config: &StressConfig) -> StressTestResult {
    let value = vec![0xABu8; config.value_size];

    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        let key = stress_key(i % config.key_count);

        let result = match i % 3 {
            0 => db.transaction(|txn| txn.put(&key, &value)),
            1 => db.transaction(|txn| txn.get(&key).map(|_| ())),
            _ => db.transaction(|txn| txn.delete(&key)),
        };

        match result {
            Ok(()) => successful += 1,
            Err(_) => failed += 1,
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Run a transaction abort stress test: every other transaction gives up.
pub fn stress_transaction_aborts(db: &TransactionDb, config: &StressConfig) -> StressTestResult {
    let value = vec![0xABu8; config.value_size];

    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        let key = stress_key(i % config.key_count);
        let should_fail = i % 2 == 0;

        let result = db.transaction(|txn| {
            txn.put(&key, &value)?;
            if should_fail {
                Err(CoreError::invalid_argument("intentional"))
            } else {
                Ok(())
            }
        });

        match result {
            Ok(()) => successful += 1,
            Err(_) => failed += 1,
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Increment one shared counter from many threads, retrying on conflict.
///
/// Each thread performs `operations / threads` increments. Successful
/// operations are committed increments; failed operations are conflicts that
/// were retried. A correct run leaves the counter at exactly the number of
/// successful operations.
pub fn stress_concurrent_increments(
    db: Arc<TransactionDb>,
    key: &[u8],
    config: &StressConfig,
) -> StressTestResult {
    let successful = Arc::new(AtomicUsize::new(0));
    let conflicts = Arc::new(AtomicUsize::new(0));
    let ops_per_thread = config.ops_per_thread();

    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|_| {
            let db = Arc::clone(&db);
            let successful = Arc::clone(&successful);
            let conflicts = Arc::clone(&conflicts);
            let key = key.to_vec();

            thread::spawn(move || {
                for _ in 0..ops_per_thread {
                    loop {
                        match increment(&db, &key) {
                            Ok(_) => {
                                successful.fetch_add(1, Ordering::Relaxed);
                                break;
                            }
                            Err(e) if e.is_conflict() => {
                                conflicts.fetch_add(1, Ordering::Relaxed);
                            }
                            Err(e) => {
                                debug!(error = %e, "increment failed");
                                break;
                            }
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        conflicts.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Move money between random accounts from many threads.
///
/// Seeds `key_count` accounts with [`INITIAL_BALANCE`] each. Every thread
/// mixes random transfers with audits that sum all balances inside one
/// transaction. An audit that commits with a total other than the seeded
/// total is counted as a violation. Conflicts are not retried and count as
/// failed operations.
pub fn stress_concurrent_transfers(
    db: Arc<TransactionDb>,
    config: &StressConfig,
) -> StressTestResult {
    let accounts = config.key_count.max(2);
    if let Err(e) = seed_accounts(&db, accounts) {
        debug!(error = %e, "seeding accounts failed");
        return StressTestResult::new(0, config.operations, Duration::ZERO);
    }
    let expected_total = INITIAL_BALANCE * accounts as u64;

    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let violations = Arc::new(AtomicUsize::new(0));
    let ops_per_thread = config.ops_per_thread();

    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|_| {
            let db = Arc::clone(&db);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let violations = Arc::clone(&violations);

            thread::spawn(move || {
                let mut rng = rand::thread_rng();
                for i in 0..ops_per_thread {
                    let result = if i % 5 == 0 {
                        audit_total(&db, accounts).map(|total| {
                            if total != expected_total {
                                violations.fetch_add(1, Ordering::Relaxed);
                            }
                        })
                    } else {
                        let from = rng.gen_range(0..accounts);
                        let to = (from + rng.gen_range(1..accounts)) % accounts;
                        let amount = rng.gen_range(1..=INITIAL_BALANCE / 10);
                        transfer(&db, from, to, amount).map(|_| ())
                    };

                    match result {
                        Ok(()) => successful.fetch_add(1, Ordering::Relaxed),
                        Err(_) => failed.fetch_add(1, Ordering::Relaxed),
                    };
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
    .with_violations(violations.load(Ordering::Relaxed))
}
