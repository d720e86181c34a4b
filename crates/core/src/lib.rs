//! Core types and traits for SeatBook
//!
//! This crate defines the foundational types shared by every layer:
//! - Key: raw byte key, ordered by byte order
//! - Value / VersionedValue: stored payload bytes and their commit version
//! - Error: error taxonomy for storage, engine and collection failures
//! - Traits: Storage and SnapshotView abstractions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;
pub mod types;
pub mod value;

pub use error::{Error, Result};
pub use traits::{SnapshotView, Storage};
pub use types::Key;
pub use value::{Value, VersionedValue};
