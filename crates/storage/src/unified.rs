//! UnifiedStore: ordered storage backend with copy-on-write snapshots
//!
//! This module implements the Storage trait using:
//! - `BTreeMap<Key, VersionedValue>` for ordered key storage
//! - `Arc` around the map so a snapshot is a reference count bump
//! - `parking_lot::RwLock` guarding the `Arc` pointer
//! - `AtomicU64` tracking the highest applied version
//!
//! # Design Notes
//!
//! - **No version history**: each key stores only its latest value
//! - **Copy-on-write**: `apply_batch` uses `Arc::make_mut`, so the map is
//!   cloned only when a live snapshot still references the old one
//! - **Atomic batches**: a batch is applied under one write lock acquisition,
//!   so no snapshot can observe part of a transaction

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use seatbook_core::{Key, Result, Storage, Value, VersionedValue};

use crate::snapshot::ClonedSnapshotView;

/// Unified storage backend using a BTreeMap behind a RwLock
///
/// Thread-safe through `parking_lot::RwLock` and `AtomicU64`.
#[derive(Debug, Default)]
pub struct UnifiedStore {
    /// The main data store: ordered map from Key to VersionedValue
    data: RwLock<Arc<BTreeMap<Key, VersionedValue>>>,
    /// Highest version applied to the store
    version: AtomicU64,
}

impl UnifiedStore {
    /// Create a new empty UnifiedStore
    ///
    /// Initial version is 0 (no writes have occurred).
    pub fn new() -> Self {
        Self {
            data: RwLock::new(Arc::new(BTreeMap::new())),
            version: AtomicU64::new(0),
        }
    }

    /// Create a snapshot of the current state
    ///
    /// O(1): the snapshot shares the current map. Later batches copy the map
    /// before mutating it, so the snapshot never changes.
    pub fn create_snapshot(&self) -> ClonedSnapshotView {
        // Read the version while holding the lock so it matches the data.
        let data = self.data.read();
        let version = self.current_version();
        ClonedSnapshotView::from_arc(version, Arc::clone(&data))
    }

    /// Number of keys in the store
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Number of snapshots and iterators still sharing the current map
    ///
    /// While this is non-zero, the next `apply_batch` copies the map.
    pub fn live_snapshot_count(&self) -> usize {
        Arc::strong_count(&self.data.read()) - 1
    }

    /// Drop all data
    ///
    /// Outstanding snapshots keep their own reference and are unaffected.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = Arc::new(BTreeMap::new());
        tracing::debug!(target: "seatbook::storage", "Store cleared");
    }
}

impl Storage for UnifiedStore {
    fn get(&self, key: &Key) -> Result<Option<VersionedValue>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn scan_prefix(&self, prefix: &Key) -> Result<Vec<(Key, VersionedValue)>> {
        self.create_snapshot().scan_prefix_vec(prefix)
    }

    fn current_version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    fn apply_batch(&self, writes: Vec<(Key, Value)>, version: u64) -> Result<()> {
        let mut data = self.data.write();
        let map = Arc::make_mut(&mut data);
        for (key, value) in writes {
            map.insert(key, VersionedValue::new(value, version));
        }
        // Update while still holding the write lock so snapshots see a
        // version consistent with the data.
        self.version.fetch_max(version, Ordering::SeqCst);
        Ok(())
    }
}
