//! Transaction manager for coordinating commit operations
//!
//! ## Commit Sequence
//!
//! ```text
//! 1. Read-only? -> committed without taking the lock
//! 2. Release the begin snapshot, then try_lock_for(timeout) on the
//!    commit lock, else Timeout
//! 3. Commits closed? -> Closed, nothing applied
//! 4. validate_transaction() against current storage
//! 5. IF conflicts: abort and return ValidationFailed
//! 6. Allocate commit_version (increment global version)
//! 7. apply_writes() - one batch, visible atomically
//! 8. Return Ok(commit_version)
//! ```
//!
//! Steps 3 to 7 run under the commit lock, so no commit can land between a
//! transaction's validation and its apply, and none can land after
//! `close_commits()` returns.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};

use seatbook_core::{Result, Storage};
use seatbook_storage::ClonedSnapshotView;

use crate::transaction::{CommitError, TransactionContext};

/// Manages transaction ids, the global version and atomic commits
pub struct TransactionManager {
    /// Global version counter
    ///
    /// Monotonically increasing. Each committed write transaction
    /// increments it by 1.
    version: AtomicU64,

    /// Next transaction ID
    next_txn_id: AtomicU64,

    /// Serializes validate-and-apply
    commit_lock: Mutex<()>,

    /// Set once by `close_commits()`; checked under the commit lock
    commits_closed: AtomicBool,
}

impl TransactionManager {
    /// Create a new transaction manager starting at `initial_version`
    pub fn new(initial_version: u64) -> Self {
        TransactionManager {
            version: AtomicU64::new(initial_version),
            next_txn_id: AtomicU64::new(1),
            commit_lock: Mutex::new(()),
            commits_closed: AtomicBool::new(false),
        }
    }

    /// Current global version
    pub fn current_version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Allocate next transaction ID
    pub fn next_txn_id(&self) -> u64 {
        self.next_txn_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Allocate next commit version
    pub fn allocate_version(&self) -> u64 {
        self.version.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Start a transaction reading from `snapshot`
    pub fn begin(&self, snapshot: ClonedSnapshotView) -> TransactionContext {
        TransactionContext::with_snapshot(self.next_txn_id(), snapshot)
    }

    /// Commit a transaction atomically
    ///
    /// Returns the commit version. A read-only transaction commits at the
    /// current version without waiting for the lock.
    ///
    /// # Errors
    /// - `CommitError::Timeout` if the lock is not acquired within `timeout`
    /// - `CommitError::ValidationFailed` if a read key changed
    /// - `CommitError::InvalidState` if the transaction is not active
    /// - `CommitError::Closed` after `close_commits()`
    pub fn commit<S: Storage + ?Sized>(
        &self,
        txn: &mut TransactionContext,
        store: &S,
        timeout: Duration,
    ) -> std::result::Result<u64, CommitError> {
        if txn.is_read_only() {
            txn.commit(store)?;
            return Ok(self.current_version());
        }

        // Reads are over; waiting on the lock must not pin the store's map.
        txn.release_snapshot();
        let _guard = match self.commit_lock.try_lock_for(timeout) {
            Some(guard) => guard,
            None => {
                let _ = txn.mark_aborted(format!("Commit lock not acquired within {:?}", timeout));
                return Err(CommitError::Timeout(timeout));
            }
        };

        if self.commits_closed.load(Ordering::SeqCst) {
            let _ = txn.mark_aborted("Commits closed".to_string());
            return Err(CommitError::Closed);
        }

        txn.commit(store)?;

        let commit_version = self.allocate_version();
        if let Err(e) = txn.apply_writes(store, commit_version) {
            tracing::error!(
                target: "seatbook::txn",
                txn_id = txn.txn_id,
                commit_version,
                error = %e,
                "Storage application failed after validation"
            );
            return Err(CommitError::Storage(e.to_string()));
        }

        Ok(commit_version)
    }

    /// Explicitly abort a transaction
    pub fn abort(&self, txn: &mut TransactionContext, reason: String) -> Result<()> {
        txn.mark_aborted(reason)
    }

    /// Hold off all write commits until the returned guard is dropped
    ///
    /// Commits waiting on the lock time out normally.
    pub fn pause_commits(&self) -> MutexGuard<'_, ()> {
        self.commit_lock.lock()
    }

    /// Refuse every later write commit
    ///
    /// Returns once any commit already past the closed check has applied.
    /// Storage can be torn down while the returned guard is held.
    pub fn close_commits(&self) -> MutexGuard<'_, ()> {
        self.commits_closed.store(true, Ordering::SeqCst);
        self.commit_lock.lock()
    }

    /// Whether `close_commits()` has been called
    pub fn commits_closed(&self) -> bool {
        self.commits_closed.load(Ordering::SeqCst)
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new(0)
    }
}
