//! Stored values
//!
//! The engine stores opaque payload bytes. Every stored value carries the
//! commit version that wrote it; versions drive read-set validation.

/// Payload bytes as stored by the engine
pub type Value = Vec<u8>;

/// A stored value together with the version of the commit that wrote it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedValue {
    /// The payload
    pub value: Value,
    /// Commit version (monotonic, never 0 for a stored value)
    pub version: u64,
}

impl VersionedValue {
    /// Create a new versioned value
    pub fn new(value: Value, version: u64) -> Self {
        Self { value, version }
    }
}
