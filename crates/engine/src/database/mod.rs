//! Engine struct and open/close logic
//!
//! The Engine owns the in-memory ordered store and the transaction
//! coordinator. It provides:
//! - `open()` / `open_with_config()`: empty store, validated configuration
//! - Closure transactions (see `transactions.rs`)
//! - `snapshot()`: consistent committed view for non-transactional reads
//! - `close()`: stops accepting work and releases stored data

pub mod config;
mod transactions;

pub use config::{EngineConfig, CONFIG_FILE_NAME};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::MutexGuard;
use tracing::{info, warn};

use seatbook_core::{Error, Result, Storage};
use seatbook_storage::{ClonedSnapshotView, UnifiedStore};

use crate::coordinator::{TransactionCoordinator, TransactionMetrics};

/// In-memory transactional key-value engine
///
/// Keys are ordered by raw bytes. All mutation goes through
/// `transaction()`; committed data is read through `snapshot()`.
///
/// `Engine` is `Send + Sync` and is normally shared as `Arc<Engine>`.
pub struct Engine {
    /// Ordered store holding every committed key
    storage: UnifiedStore,

    /// Transaction lifecycle, version allocation and metrics
    coordinator: TransactionCoordinator,

    /// Configuration the engine was opened with
    config: EngineConfig,

    /// Cleared by `close()`; checked on every entry point
    accepting_transactions: AtomicBool,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("name", &self.config.name)
            .field("open", &self.is_open())
            .field("version", &self.current_version())
            .finish()
    }
}

impl Engine {
    /// Open an empty engine with the default configuration
    pub fn open() -> Result<Arc<Self>> {
        Self::open_with_config(EngineConfig::default())
    }

    /// Open an empty engine with the given configuration
    ///
    /// # Errors
    /// `Error::EngineInit` if the configuration is unusable.
    pub fn open_with_config(cfg: EngineConfig) -> Result<Arc<Self>> {
        cfg.validate()?;

        let storage = UnifiedStore::new();
        let coordinator = TransactionCoordinator::new(storage.current_version());

        info!(
            target: "seatbook::engine",
            name = %cfg.name,
            commit_timeout_ms = cfg.commit_timeout_ms,
            "Engine opened"
        );

        Ok(Arc::new(Self {
            storage,
            coordinator,
            config: cfg,
            accepting_transactions: AtomicBool::new(true),
        }))
    }

    /// Check if the engine is open and accepting transactions
    pub fn is_open(&self) -> bool {
        self.accepting_transactions.load(Ordering::SeqCst)
    }

    pub(crate) fn check_accepting(&self) -> Result<()> {
        if !self.is_open() {
            return Err(Error::EngineClosed);
        }
        Ok(())
    }

    /// Configuration the engine was opened with
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Highest committed version
    pub fn current_version(&self) -> u64 {
        self.storage.current_version()
    }

    /// Transaction statistics
    pub fn metrics(&self) -> TransactionMetrics {
        self.coordinator.metrics()
    }

    /// Consistent view of committed data
    ///
    /// The view never changes, even as later transactions commit.
    ///
    /// # Errors
    /// `Error::EngineClosed` after `close()`.
    pub fn snapshot(&self) -> Result<ClonedSnapshotView> {
        self.check_accepting()?;
        Ok(self.storage.create_snapshot())
    }

    /// Hold off all write commits until the returned guard is dropped
    ///
    /// Snapshots and read-only transactions proceed. Write transactions wait
    /// for the guard up to their commit timeout.
    pub fn pause_commits(&self) -> MutexGuard<'_, ()> {
        self.coordinator.pause_commits()
    }

    /// Stop accepting work and release stored data
    ///
    /// In-flight transactions get up to the configured commit timeout to
    /// finish; any still running after that fail at commit with
    /// `Error::EngineClosed`. Later calls to `transaction` or `snapshot` fail
    /// with `Error::EngineClosed`. Closing twice is a no-op.
    pub fn close(&self) {
        if !self.accepting_transactions.swap(false, Ordering::SeqCst) {
            return;
        }

        let deadline = Instant::now() + self.config.commit_timeout();
        while self.coordinator.active_count() > 0 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        let still_active = self.coordinator.active_count();
        if still_active > 0 {
            warn!(
                target: "seatbook::engine",
                name = %self.config.name,
                still_active,
                "Closing with transactions still in flight"
            );
        }

        // Stragglers past the accepting check fail with EngineClosed at
        // commit instead of writing into the cleared store.
        let _commits = self.coordinator.close_commits();
        self.storage.clear();

        let metrics = self.coordinator.metrics();
        info!(
            target: "seatbook::engine",
            name = %self.config.name,
            committed = metrics.total_committed,
            commit_rate = metrics.commit_rate(),
            "Engine closed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatbook_core::{Key, SnapshotView};

    static_assertions::assert_impl_all!(Engine: Send, Sync);

    #[test]
    fn test_open_default() {
        let engine = Engine::open().unwrap();
        assert!(engine.is_open());
        assert_eq!(engine.current_version(), 0);
        assert_eq!(engine.config(), &EngineConfig::default());
    }

    #[test]
    fn test_open_rejects_zero_timeout() {
        let cfg = EngineConfig {
            commit_timeout_ms: 0,
            ..EngineConfig::default()
        };
        let err = Engine::open_with_config(cfg).unwrap_err();
        assert!(matches!(err, Error::EngineInit(_)));
    }

    #[test]
    fn test_snapshot_after_close_fails() {
        let engine = Engine::open().unwrap();
        engine.close();
        assert!(!engine.is_open());
        assert!(engine.snapshot().unwrap_err().is_closed());
    }

    #[test]
    fn test_close_releases_data_but_not_snapshots() {
        let engine = Engine::open().unwrap();
        engine
            .transaction(|txn| txn.put(Key::from("k"), b"v".to_vec()))
            .unwrap();
        let snapshot = engine.snapshot().unwrap();

        engine.close();
        engine.close();

        assert_eq!(engine.storage.len(), 0);
        assert!(snapshot.get(&Key::from("k")).unwrap().is_some());
    }
}
