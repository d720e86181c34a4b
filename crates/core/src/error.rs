//! Error types for SeatBook
//!
//! This module defines the error taxonomy shared by the storage, engine and
//! collection layers. We use `thiserror` for `Display` and `Error` impls.
//! Domain errors of the booking workflow live in `seatbook-booking` and wrap
//! this type.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for SeatBook operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the storage core
#[derive(Debug, Error)]
pub enum Error {
    /// No entry exists at `collection/key`
    #[error("Entry not found: {collection}/{key}")]
    NotFound {
        /// Collection that was searched
        collection: String,
        /// Entity key within the collection
        key: String,
    },

    /// A payload could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A stored payload could not be decoded into the requested type
    #[error("Deserialization error for {key}: {message}")]
    Deserialization {
        /// Storage key of the payload
        key: String,
        /// Decoder message
        message: String,
    },

    /// Commit-time validation found that data read by the transaction changed
    #[error("Transaction conflict: {conflicts} conflicting key(s), first at {key}")]
    EngineConflict {
        /// First conflicting storage key
        key: String,
        /// Number of conflicting keys
        conflicts: usize,
    },

    /// The commit lock could not be acquired in time
    #[error("Transaction timed out after {0:?} waiting for commit")]
    EngineTimeout(Duration),

    /// The engine was closed
    #[error("Engine is closed")]
    EngineClosed,

    /// The engine could not be initialized
    #[error("Engine initialization failed: {0}")]
    EngineInit(String),

    /// Invalid operation or input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Writing to a caller-supplied sink failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal invariant violation
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a not-found error for `collection/key`
    pub fn not_found(collection: impl Into<String>, key: impl Into<String>) -> Self {
        Error::NotFound {
            collection: collection.into(),
            key: key.into(),
        }
    }

    /// Create an invalid-input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }

    /// Whether this is a commit conflict
    ///
    /// Conflicts are the one storage failure a caller can expect to resolve by
    /// re-running the whole operation.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::EngineConflict { .. })
    }

    /// Whether this is a not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Whether the engine rejected the call because it is closed
    pub fn is_closed(&self) -> bool {
        matches!(self, Error::EngineClosed)
    }
}
