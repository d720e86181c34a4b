//! Concurrency layer for SeatBook
//!
//! This crate implements optimistic concurrency control (OCC) with:
//! - TransactionContext: snapshot reads, buffered writes, read-set tracking
//! - Read-set validation at commit time (first-committer-wins)
//! - TransactionManager: serialized commits with a bounded wait

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod manager;
pub mod transaction;
pub mod validation;

pub use manager::TransactionManager;
pub use transaction::{ApplyResult, CommitError, TransactionContext, TransactionStatus};
pub use validation::{
    validate_read_set, validate_scanned_prefixes, validate_transaction, ConflictType,
    ValidationResult,
};
