//! Transaction context for OCC
//!
//! TransactionContext tracks every read and buffered write of one
//! transaction. Reads come from a snapshot taken at begin; writes stay
//! private until commit, when the read-set is validated and the write-set is
//! applied as a single batch.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use seatbook_core::{Error, Key, Result, SnapshotView, Storage, Value};
use seatbook_storage::ClonedSnapshotView;

use crate::validation::{validate_transaction, ValidationResult};

/// Error type for commit failures
///
/// A failed commit leaves storage untouched.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CommitError {
    /// Data read by the transaction changed before it could commit
    #[error("Commit failed: {} conflict(s)", .0.conflict_count())]
    ValidationFailed(ValidationResult),

    /// The commit lock was not acquired within the allowed wait
    #[error("Commit timed out after {0:?}")]
    Timeout(Duration),

    /// Transaction was not in the correct state for commit
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Storage rejected the write batch
    #[error("Storage error: {0}")]
    Storage(String),

    /// Commits were shut off while the transaction was in flight
    #[error("Commits are closed")]
    Closed,
}

impl From<CommitError> for Error {
    fn from(e: CommitError) -> Self {
        match e {
            CommitError::ValidationFailed(result) => Error::EngineConflict {
                key: result
                    .first_conflict_key()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
                conflicts: result.conflict_count(),
            },
            CommitError::Timeout(waited) => Error::EngineTimeout(waited),
            CommitError::InvalidState(msg) => Error::InvalidInput(msg),
            CommitError::Storage(msg) => Error::Internal(msg),
            CommitError::Closed => Error::EngineClosed,
        }
    }
}

/// Result of applying transaction writes to storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyResult {
    /// Version assigned to all writes in this transaction
    pub commit_version: u64,
    /// Number of puts applied
    pub puts_applied: usize,
}

/// Status of a transaction in its lifecycle
///
/// State transitions:
/// - `Active` → `Validating` (begin commit)
/// - `Validating` → `Committed` (validation passed)
/// - `Validating` → `Aborted` (conflict detected)
/// - `Active` → `Aborted` (caller error or timeout)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Transaction is executing, can read/write
    Active,
    /// Transaction is being validated for conflicts
    Validating,
    /// Transaction committed successfully
    Committed,
    /// Transaction was aborted
    Aborted {
        /// Human-readable reason for abort
        reason: String,
    },
}

/// Per-transaction state for optimistic concurrency control
///
/// # Lifecycle
///
/// 1. **BEGIN**: created with a snapshot, status is `Active`
/// 2. **READ/WRITE**: `get()`, `scan_prefix()`, `put()`
/// 3. **COMMIT**: `commit()` validates, then `apply_writes()` publishes
pub struct TransactionContext {
    /// Unique transaction ID
    pub txn_id: u64,

    /// Snapshot version at transaction start
    pub start_version: u64,

    snapshot: ClonedSnapshotView,

    /// Keys read from the snapshot and the version observed
    ///
    /// Version 0 means the key did not exist when read.
    pub read_set: HashMap<Key, u64>,

    /// Buffered writes, ordered so prefix scans can merge them
    pub write_set: BTreeMap<Key, Value>,

    /// Prefixes scanned from the snapshot
    ///
    /// At commit, a key present under one of these prefixes but missing from
    /// the read-set was inserted concurrently and is a conflict.
    scanned_prefixes: Vec<Key>,

    /// Current transaction status
    pub status: TransactionStatus,

    start_time: Instant,
}

impl std::fmt::Debug for TransactionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionContext")
            .field("txn_id", &self.txn_id)
            .field("start_version", &self.start_version)
            .field("reads", &self.read_set.len())
            .field("writes", &self.write_set.len())
            .field("status", &self.status)
            .finish()
    }
}

impl TransactionContext {
    /// Create a transaction reading from `snapshot`
    pub fn with_snapshot(txn_id: u64, snapshot: ClonedSnapshotView) -> Self {
        TransactionContext {
            txn_id,
            start_version: snapshot.version(),
            snapshot,
            read_set: HashMap::new(),
            write_set: BTreeMap::new(),
            scanned_prefixes: Vec::new(),
            status: TransactionStatus::Active,
            start_time: Instant::now(),
        }
    }

    // === Read Operations ===

    /// Get a value from the transaction's view
    ///
    /// Own buffered writes win (read-your-writes) and are not tracked.
    /// Snapshot reads are recorded in the read-set, absent keys at version 0.
    pub fn get(&mut self, key: &Key) -> Result<Option<Value>> {
        self.ensure_active()?;

        if let Some(value) = self.write_set.get(key) {
            return Ok(Some(value.clone()));
        }

        let versioned = self.snapshot.get(key)?;
        match versioned {
            Some(vv) => {
                self.read_set.insert(key.clone(), vv.version);
                Ok(Some(vv.value))
            }
            None => {
                self.read_set.insert(key.clone(), 0);
                Ok(None)
            }
        }
    }

    /// Check if a key exists in the transaction's view
    ///
    /// Tracked in the read-set like `get()`.
    pub fn exists(&mut self, key: &Key) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Scan keys with a prefix, merging buffered writes, in key order
    ///
    /// Every snapshot key returned is recorded in the read-set, and the
    /// prefix itself is recorded so a concurrent insert under it conflicts.
    pub fn scan_prefix(&mut self, prefix: &Key) -> Result<Vec<(Key, Value)>> {
        self.ensure_active()?;
        if !self.scanned_prefixes.contains(prefix) {
            self.scanned_prefixes.push(prefix.clone());
        }

        let mut results: BTreeMap<Key, Value> = BTreeMap::new();
        for (key, vv) in self.snapshot.iter_prefix(prefix) {
            self.read_set.insert(key.clone(), vv.version);
            results.insert(key, vv.value);
        }

        for (key, value) in self
            .write_set
            .range::<Key, _>(prefix..)
            .take_while(|(k, _)| k.starts_with(prefix))
        {
            results.insert(key.clone(), value.clone());
        }

        Ok(results.into_iter().collect())
    }

    /// Version recorded for a key in the read-set
    pub fn get_read_version(&self, key: &Key) -> Option<u64> {
        self.read_set.get(key).copied()
    }

    /// Prefixes scanned so far, in first-scan order
    pub fn scanned_prefixes(&self) -> &[Key] {
        &self.scanned_prefixes
    }

    // === Write Operations ===

    /// Buffer a write
    ///
    /// Not visible to other transactions until commit. Writes are blind: no
    /// read-set entry unless the key is read explicitly.
    pub fn put(&mut self, key: Key, value: Value) -> Result<()> {
        self.ensure_active()?;
        self.write_set.insert(key, value);
        Ok(())
    }

    // === State Management ===

    /// Check if transaction is active
    pub fn is_active(&self) -> bool {
        matches!(self.status, TransactionStatus::Active)
    }

    /// Check if transaction is committed
    pub fn is_committed(&self) -> bool {
        matches!(self.status, TransactionStatus::Committed)
    }

    /// Check if transaction is aborted
    pub fn is_aborted(&self) -> bool {
        matches!(self.status, TransactionStatus::Aborted { .. })
    }

    /// Time since the transaction began
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Check if transaction can accept operations
    pub fn ensure_active(&self) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(Error::invalid_input(format!(
                "Transaction {} is not active: {:?}",
                self.txn_id, self.status
            )))
        }
    }

    /// Transition `Active` → `Validating`
    pub fn mark_validating(&mut self) -> Result<()> {
        self.ensure_active()?;
        self.status = TransactionStatus::Validating;
        Ok(())
    }

    /// Transition `Validating` → `Committed`
    pub fn mark_committed(&mut self) -> Result<()> {
        match &self.status {
            TransactionStatus::Validating => {
                self.status = TransactionStatus::Committed;
                Ok(())
            }
            _ => Err(Error::invalid_input(format!(
                "Cannot commit transaction {} from state {:?}",
                self.txn_id, self.status
            ))),
        }
    }

    /// Abort the transaction and discard buffered writes
    ///
    /// Allowed from `Active` or `Validating`.
    pub fn mark_aborted(&mut self, reason: String) -> Result<()> {
        match &self.status {
            TransactionStatus::Committed => Err(Error::invalid_input(format!(
                "Cannot abort committed transaction {}",
                self.txn_id
            ))),
            TransactionStatus::Aborted { .. } => Err(Error::invalid_input(format!(
                "Transaction {} already aborted",
                self.txn_id
            ))),
            _ => {
                self.status = TransactionStatus::Aborted { reason };
                self.write_set.clear();
                self.release_snapshot();
                Ok(())
            }
        }
    }

    /// Abort reason, if aborted
    pub fn abort_reason(&self) -> Option<&str> {
        match &self.status {
            TransactionStatus::Aborted { reason } => Some(reason),
            _ => None,
        }
    }

    /// Drop the reference to the begin snapshot
    ///
    /// Once no reads remain the transaction must not pin the store's map,
    /// otherwise every batch applied meanwhile has to copy the whole map.
    /// Later reads see an empty view, so call this only when reading is over.
    pub fn release_snapshot(&mut self) {
        self.snapshot = ClonedSnapshotView::empty();
    }

    // === Commit ===

    /// Validate against current storage and move to `Committed` or `Aborted`
    ///
    /// Performs the state transitions only; `apply_writes()` publishes.
    /// Callers must hold the commit lock so that no other commit lands
    /// between validation and apply.
    pub fn commit<S: Storage + ?Sized>(&mut self, store: &S) -> std::result::Result<(), CommitError> {
        if !self.is_active() {
            return Err(CommitError::InvalidState(format!(
                "Cannot commit transaction {} from {:?} state - must be Active",
                self.txn_id, self.status
            )));
        }
        self.status = TransactionStatus::Validating;
        self.release_snapshot();

        let validation = match validate_transaction(self, store) {
            Ok(v) => v,
            Err(e) => {
                self.status = TransactionStatus::Aborted {
                    reason: format!("Validation error: {}", e),
                };
                self.write_set.clear();
                return Err(CommitError::Storage(e.to_string()));
            }
        };

        if !validation.is_valid() {
            self.status = TransactionStatus::Aborted {
                reason: format!(
                    "Commit failed: {} conflict(s) detected",
                    validation.conflict_count()
                ),
            };
            self.write_set.clear();
            return Err(CommitError::ValidationFailed(validation));
        }

        self.status = TransactionStatus::Committed;
        Ok(())
    }

    /// Apply all buffered writes to storage as one batch
    ///
    /// All keys get the same `commit_version`.
    pub fn apply_writes<S: Storage + ?Sized>(
        &self,
        store: &S,
        commit_version: u64,
    ) -> Result<ApplyResult> {
        if !self.is_committed() {
            return Err(Error::invalid_input(format!(
                "Cannot apply writes: transaction {} is {:?}, must be Committed",
                self.txn_id, self.status
            )));
        }

        let writes: Vec<(Key, Value)> = self
            .write_set
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let puts_applied = writes.len();
        store.apply_batch(writes, commit_version)?;

        Ok(ApplyResult {
            commit_version,
            puts_applied,
        })
    }

    // === Introspection ===

    /// Number of keys in the read-set
    pub fn read_count(&self) -> usize {
        self.read_set.len()
    }

    /// Number of buffered writes
    pub fn write_count(&self) -> usize {
        self.write_set.len()
    }

    /// True if nothing was written
    pub fn is_read_only(&self) -> bool {
        self.write_set.is_empty()
    }
}
