//! Snapshot implementation for UnifiedStore
//!
//! ClonedSnapshotView holds a shared reference to the map that was current
//! when the snapshot was taken. Writers never mutate a map that a snapshot
//! references (they copy it first), so reads need no locking.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use seatbook_core::{Key, Result, SnapshotView, VersionedValue};

/// Immutable point-in-time view of the store
#[derive(Debug, Clone)]
pub struct ClonedSnapshotView {
    /// Store version when the snapshot was taken
    version: u64,
    /// Shared map as of `version`
    data: Arc<BTreeMap<Key, VersionedValue>>,
}

impl ClonedSnapshotView {
    /// Create a snapshot owning the given map
    pub fn new(version: u64, data: BTreeMap<Key, VersionedValue>) -> Self {
        Self {
            version,
            data: Arc::new(data),
        }
    }

    /// Create a snapshot sharing an existing map
    pub fn from_arc(version: u64, data: Arc<BTreeMap<Key, VersionedValue>>) -> Self {
        Self { version, data }
    }

    /// Create an empty snapshot at version 0
    pub fn empty() -> Self {
        Self::new(0, BTreeMap::new())
    }

    /// Number of keys visible in this snapshot
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether this snapshot has no keys
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Lazily iterate entries whose key starts with `prefix`, in key order
    ///
    /// The iterator owns a reference to the snapshot's map, so it can outlive
    /// the snapshot value and is unaffected by later commits.
    pub fn iter_prefix(&self, prefix: &Key) -> PrefixIter {
        PrefixIter {
            data: Arc::clone(&self.data),
            prefix: prefix.clone(),
            cursor: None,
            done: false,
        }
    }

    pub(crate) fn scan_prefix_vec(&self, prefix: &Key) -> Result<Vec<(Key, VersionedValue)>> {
        Ok(self.iter_prefix(prefix).collect())
    }
}

impl SnapshotView for ClonedSnapshotView {
    fn get(&self, key: &Key) -> Result<Option<VersionedValue>> {
        Ok(self.data.get(key).cloned())
    }

    fn scan_prefix(&self, prefix: &Key) -> Result<Vec<(Key, VersionedValue)>> {
        self.scan_prefix_vec(prefix)
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Lazy ordered iterator over one key prefix of a snapshot
///
/// Each step resumes the range search after the last returned key, so no
/// borrow of the map is held between calls to `next`.
#[derive(Debug)]
pub struct PrefixIter {
    data: Arc<BTreeMap<Key, VersionedValue>>,
    prefix: Key,
    cursor: Option<Key>,
    done: bool,
}

impl Iterator for PrefixIter {
    type Item = (Key, VersionedValue);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let lower = match &self.cursor {
            Some(last) => Bound::Excluded(last),
            None => Bound::Included(&self.prefix),
        };

        let next = self
            .data
            .range::<Key, _>((lower, Bound::Unbounded))
            .next()
            .filter(|(k, _)| k.starts_with(&self.prefix))
            .map(|(k, v)| (k.clone(), v.clone()));

        match next {
            Some((key, value)) => {
                self.cursor = Some(key.clone());
                Some((key, value))
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}
