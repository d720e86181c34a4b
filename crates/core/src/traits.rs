//! Core traits for storage and snapshot abstraction
//!
//! These traits let the concurrency layer validate and apply transactions
//! without knowing how the ordered store is implemented.

use crate::error::Result;
use crate::types::Key;
use crate::value::{Value, VersionedValue};

/// Storage abstraction for the ordered key-value backend
///
/// Thread safety: all methods must be safe to call concurrently from
/// multiple threads (requires Send + Sync).
pub trait Storage: Send + Sync {
    /// Get the latest committed value for a key
    ///
    /// Returns None if the key doesn't exist.
    fn get(&self, key: &Key) -> Result<Option<VersionedValue>>;

    /// Get the version of the latest committed value for a key
    ///
    /// Returns 0 if the key doesn't exist.
    fn version_of(&self, key: &Key) -> Result<u64> {
        Ok(self.get(key)?.map(|vv| vv.version).unwrap_or(0))
    }

    /// Scan keys with the given prefix, in key order
    fn scan_prefix(&self, prefix: &Key) -> Result<Vec<(Key, VersionedValue)>>;

    /// Highest version applied so far
    fn current_version(&self) -> u64;

    /// Apply a batch of writes atomically, all stamped with `version`
    ///
    /// Readers observe either none or all of the batch.
    fn apply_batch(&self, writes: Vec<(Key, Value)>, version: u64) -> Result<()>;
}

/// Consistent point-in-time view of storage
///
/// A snapshot never shows writes committed after it was taken, nor any
/// partially applied batch.
pub trait SnapshotView: Send + Sync {
    /// Get a value as of this snapshot
    fn get(&self, key: &Key) -> Result<Option<VersionedValue>>;

    /// Scan keys with the given prefix as of this snapshot, in key order
    fn scan_prefix(&self, prefix: &Key) -> Result<Vec<(Key, VersionedValue)>>;

    /// Version this snapshot was taken at
    fn version(&self) -> u64;
}
