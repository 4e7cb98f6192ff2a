//! Process-wide commit serialization.
//!
//! Every commit that has writes takes this lock before validating and holds
//! it until the store has applied the batch. That makes "validate then apply"
//! a single step with respect to every other committer in the process. Commits
//! touching disjoint keys still queue behind each other.

use parking_lot::{const_mutex, Mutex, MutexGuard};

static COMMIT_LOCK: Mutex<()> = const_mutex(());

/// Guard held for the validate-and-apply phase of a commit.
pub(crate) struct CommitGuard {
    _guard: MutexGuard<'static, ()>,
}

/// Blocks until this thread is the only committer.
///
/// The lock is never re-entered: nothing reachable while it is held calls back
/// into commit.
pub(crate) fn acquire() -> CommitGuard {
    CommitGuard {
        _guard: COMMIT_LOCK.lock(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn guard_excludes_other_committers() {
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let inside = Arc::clone(&inside);
                let max_seen = Arc::clone(&max_seen);
                thread::spawn(move || {
                    for _ in 0..100 {
                        let _guard = acquire();
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }
}
