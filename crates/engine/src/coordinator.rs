//! Transaction coordinator
//!
//! Sits between the engine and `TransactionManager`. Every transaction the
//! engine starts is paired with an `InFlight` token; dropping the token is
//! what ends the transaction for accounting, so a closure that panics still
//! leaves the active count balanced.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::MutexGuard;
use tracing::{debug, warn};

use seatbook_concurrency::{TransactionContext, TransactionManager};
use seatbook_core::{Error, Result, Storage};
use seatbook_storage::UnifiedStore;

/// Transaction coordinator for the engine
pub struct TransactionCoordinator {
    manager: TransactionManager,
    active: AtomicU64,
    started: AtomicU64,
    committed: AtomicU64,
    aborted: AtomicU64,
}

/// Marks one started transaction as in flight until dropped
///
/// Counts as committed only if `commit` succeeded.
#[must_use = "dropping the token ends the transaction as aborted"]
pub struct InFlight<'a> {
    coordinator: &'a TransactionCoordinator,
    committed: bool,
}

impl InFlight<'_> {
    /// Commit `txn` and settle this token
    ///
    /// Converts commit failures into `Error::EngineConflict`,
    /// `Error::EngineTimeout` or `Error::EngineClosed`.
    pub fn commit<S: Storage + ?Sized>(
        mut self,
        txn: &mut TransactionContext,
        store: &S,
        timeout: Duration,
    ) -> Result<u64> {
        let writes = txn.write_count();
        match self.coordinator.manager.commit(txn, store, timeout) {
            Ok(version) => {
                self.committed = true;
                debug!(
                    target: "seatbook::txn",
                    txn_id = txn.txn_id,
                    commit_version = version,
                    writes,
                    "Transaction committed"
                );
                Ok(version)
            }
            Err(e) => {
                warn!(target: "seatbook::txn", txn_id = txn.txn_id, error = %e, "Transaction aborted");
                Err(Error::from(e))
            }
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let counter = if self.committed {
            &self.coordinator.committed
        } else {
            &self.coordinator.aborted
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.coordinator.active.fetch_sub(1, Ordering::SeqCst);
    }
}

impl TransactionCoordinator {
    /// Create a coordinator whose versions continue from `initial_version`
    pub fn new(initial_version: u64) -> Self {
        Self {
            manager: TransactionManager::new(initial_version),
            active: AtomicU64::new(0),
            started: AtomicU64::new(0),
            committed: AtomicU64::new(0),
            aborted: AtomicU64::new(0),
        }
    }

    /// Begin a transaction over a snapshot of `storage`
    pub fn start_transaction(&self, storage: &UnifiedStore) -> (TransactionContext, InFlight<'_>) {
        let txn = self.manager.begin(storage.create_snapshot());
        self.active.fetch_add(1, Ordering::SeqCst);
        self.started.fetch_add(1, Ordering::Relaxed);

        debug!(
            target: "seatbook::txn",
            txn_id = txn.txn_id,
            start_version = txn.start_version,
            "Transaction started"
        );
        (
            txn,
            InFlight {
                coordinator: self,
                committed: false,
            },
        )
    }

    /// Highest allocated commit version
    pub fn current_version(&self) -> u64 {
        self.manager.current_version()
    }

    /// Hold off write commits until the guard is dropped
    pub fn pause_commits(&self) -> MutexGuard<'_, ()> {
        self.manager.pause_commits()
    }

    /// Refuse all later write commits; see `TransactionManager::close_commits`
    pub fn close_commits(&self) -> MutexGuard<'_, ()> {
        self.manager.close_commits()
    }

    /// Transactions started and not yet settled
    pub fn active_count(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }

    /// Point-in-time counters
    pub fn metrics(&self) -> TransactionMetrics {
        TransactionMetrics {
            active_count: self.active_count(),
            total_started: self.started.load(Ordering::Relaxed),
            total_committed: self.committed.load(Ordering::Relaxed),
            total_aborted: self.aborted.load(Ordering::Relaxed),
        }
    }
}

/// Transaction counters reported by `Engine::metrics`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionMetrics {
    /// Transactions currently running
    pub active_count: u64,
    /// Transactions started
    pub total_started: u64,
    /// Transactions committed
    pub total_committed: u64,
    /// Transactions aborted, by the caller, a conflict, a timeout or close
    pub total_aborted: u64,
}

impl TransactionMetrics {
    /// Committed share of started transactions, 0.0 before any start
    pub fn commit_rate(&self) -> f64 {
        if self.total_started == 0 {
            0.0
        } else {
            self.total_committed as f64 / self.total_started as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatbook_core::Key;

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn test_fresh_coordinator() {
        let coordinator = TransactionCoordinator::new(7);
        assert_eq!(coordinator.current_version(), 7);
        assert_eq!(
            coordinator.metrics(),
            TransactionMetrics {
                active_count: 0,
                total_started: 0,
                total_committed: 0,
                total_aborted: 0,
            }
        );
        assert_eq!(coordinator.metrics().commit_rate(), 0.0);
    }

    #[test]
    fn test_commit_settles_token() {
        let store = UnifiedStore::new();
        let coordinator = TransactionCoordinator::new(0);

        let (mut txn, in_flight) = coordinator.start_transaction(&store);
        assert_eq!(coordinator.active_count(), 1);
        txn.put(Key::from("a"), vec![1]).unwrap();
        assert_eq!(in_flight.commit(&mut txn, &store, WAIT).unwrap(), 1);

        let metrics = coordinator.metrics();
        assert_eq!(metrics.active_count, 0);
        assert_eq!(metrics.total_committed, 1);
        assert_eq!(metrics.commit_rate(), 1.0);
    }

    #[test]
    fn test_conflict_counts_as_abort() {
        let store = UnifiedStore::new();
        let coordinator = TransactionCoordinator::new(0);

        let (mut t1, f1) = coordinator.start_transaction(&store);
        let (mut t2, f2) = coordinator.start_transaction(&store);
        t1.get(&Key::from("k")).unwrap();
        t2.get(&Key::from("k")).unwrap();
        t1.put(Key::from("k"), vec![1]).unwrap();
        t2.put(Key::from("k"), vec![2]).unwrap();

        f1.commit(&mut t1, &store, WAIT).unwrap();
        let err = f2.commit(&mut t2, &store, WAIT).unwrap_err();

        assert!(err.is_conflict());
        let metrics = coordinator.metrics();
        assert_eq!(metrics.total_started, 2);
        assert_eq!(metrics.total_aborted, 1);
        assert_eq!(metrics.active_count, 0);
    }

    #[test]
    fn test_timeout_converted() {
        let store = UnifiedStore::new();
        let coordinator = TransactionCoordinator::new(0);
        let (mut txn, in_flight) = coordinator.start_transaction(&store);
        txn.put(Key::from("k"), vec![1]).unwrap();

        let _guard = coordinator.pause_commits();
        let err = in_flight
            .commit(&mut txn, &store, Duration::from_millis(10))
            .unwrap_err();
        assert!(matches!(err, Error::EngineTimeout(_)));
    }

    #[test]
    fn test_dropped_token_counts_as_abort() {
        let store = UnifiedStore::new();
        let coordinator = TransactionCoordinator::new(0);

        let (_txn, in_flight) = coordinator.start_transaction(&store);
        drop(in_flight);

        let metrics = coordinator.metrics();
        assert_eq!(metrics.active_count, 0);
        assert_eq!(metrics.total_aborted, 1);
    }

    #[test]
    fn test_commit_after_close_is_engine_closed() {
        let store = UnifiedStore::new();
        let coordinator = TransactionCoordinator::new(0);
        let (mut txn, in_flight) = coordinator.start_transaction(&store);
        txn.put(Key::from("k"), vec![1]).unwrap();

        drop(coordinator.close_commits());
        let err = in_flight.commit(&mut txn, &store, WAIT).unwrap_err();
        assert!(matches!(err, Error::EngineClosed));
        assert!(store.is_empty());
    }
}
