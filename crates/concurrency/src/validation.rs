//! Transaction validation for OCC
//!
//! Rules:
//! - First-committer-wins based on the READ-SET, not the write-set
//! - Blind writes (write without read) do NOT conflict
//! - A key read while absent is recorded at version 0, so a concurrent
//!   insert of that key is a conflict
//! - A key that appears under a scanned prefix without being in the
//!   read-set was inserted concurrently (phantom) and conflicts
//! - Read-only transactions always validate

use std::collections::HashMap;

use seatbook_core::{Key, Result, Storage};

use crate::transaction::TransactionContext;

/// Types of conflicts found during validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictType {
    /// Key was read at one version but the current version differs
    ReadWriteConflict {
        /// The key that has a conflict
        key: Key,
        /// Version recorded in the read-set
        read_version: u64,
        /// Version in storage at validation time
        current_version: u64,
    },
    /// Key inserted under a prefix the transaction scanned
    PhantomInsert {
        /// The scanned prefix
        prefix: Key,
        /// The key that appeared
        key: Key,
    },
}

impl ConflictType {
    /// The conflicting key
    pub fn key(&self) -> &Key {
        match self {
            ConflictType::ReadWriteConflict { key, .. } => key,
            ConflictType::PhantomInsert { key, .. } => key,
        }
    }
}

/// Result of transaction validation
///
/// A transaction commits only if `is_valid()` returns true.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// All conflicts detected during validation
    pub conflicts: Vec<ConflictType>,
}

impl ValidationResult {
    /// A successful validation result
    pub fn ok() -> Self {
        ValidationResult {
            conflicts: Vec::new(),
        }
    }

    /// A validation result with a single conflict
    pub fn conflict(conflict: ConflictType) -> Self {
        ValidationResult {
            conflicts: vec![conflict],
        }
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Merge another validation result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        self.conflicts.extend(other.conflicts);
    }

    /// Number of conflicts
    pub fn conflict_count(&self) -> usize {
        self.conflicts.len()
    }

    /// The smallest conflicting key, if any
    pub fn first_conflict_key(&self) -> Option<&Key> {
        self.conflicts.iter().map(ConflictType::key).min()
    }
}

/// Validate the read-set against current storage state
///
/// Every key whose current version differs from the recorded one is reported.
pub fn validate_read_set<S: Storage + ?Sized>(
    read_set: &HashMap<Key, u64>,
    store: &S,
) -> Result<ValidationResult> {
    let mut result = ValidationResult::ok();

    for (key, read_version) in read_set {
        let current_version = store.version_of(key)?;
        if current_version != *read_version {
            result.conflicts.push(ConflictType::ReadWriteConflict {
                key: key.clone(),
                read_version: *read_version,
                current_version,
            });
        }
    }

    Ok(result)
}

/// Find keys under scanned prefixes that the read-set never saw
pub fn validate_scanned_prefixes<S: Storage + ?Sized>(
    prefixes: &[Key],
    read_set: &HashMap<Key, u64>,
    store: &S,
) -> Result<ValidationResult> {
    let mut result = ValidationResult::ok();

    for prefix in prefixes {
        for (key, _) in store.scan_prefix(prefix)? {
            if !read_set.contains_key(&key) {
                result.conflicts.push(ConflictType::PhantomInsert {
                    prefix: prefix.clone(),
                    key,
                });
            }
        }
    }

    Ok(result)
}

/// Validate a whole transaction
pub fn validate_transaction<S: Storage + ?Sized>(
    txn: &TransactionContext,
    store: &S,
) -> Result<ValidationResult> {
    if txn.is_read_only() {
        return Ok(ValidationResult::ok());
    }
    let mut result = validate_read_set(&txn.read_set, store)?;
    result.merge(validate_scanned_prefixes(
        txn.scanned_prefixes(),
        &txn.read_set,
        store,
    )?);
    Ok(result)
}
