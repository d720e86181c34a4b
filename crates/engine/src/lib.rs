//! Transaction engine for SeatBook
//!
//! This crate ties the lower layers together:
//! - Engine: open/close, closure transactions with commit timeouts, snapshots
//! - EngineConfig: TOML-backed configuration
//! - TransactionCoordinator: commit orchestration and transaction metrics
//!
//! The engine is the only component that owns the store. Everything above it
//! reaches data through `Engine::transaction` or `Engine::snapshot`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod coordinator;
pub mod database;

pub use coordinator::{InFlight, TransactionCoordinator, TransactionMetrics};
pub use database::{Engine, EngineConfig};
pub use seatbook_concurrency::TransactionContext;
pub use seatbook_storage::{ClonedSnapshotView, PrefixIter};
