//! Storage layer for SeatBook
//!
//! This crate implements the in-memory ordered store:
//! - UnifiedStore: BTreeMap-based storage behind a RwLock, with the map held
//!   in an `Arc` so snapshots are a pointer copy
//! - ClonedSnapshotView: immutable point-in-time view of the store
//! - PrefixIter: lazy, ordered iteration over one key prefix of a snapshot

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod snapshot;
pub mod unified;

pub use snapshot::{ClonedSnapshotView, PrefixIter};
pub use unified::UnifiedStore;
