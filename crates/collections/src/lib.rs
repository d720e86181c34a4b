//! Typed collections over the SeatBook engine
//!
//! A collection is a key namespace inside the engine: every entity is stored
//! at `collection/entity_key` as a JSON payload. This crate provides:
//! - `Model`: the capability an entity type implements to be stored
//! - `WriteBatch`: a set of entries written in one transaction
//! - `CollectionStore`: typed put/get/scan plus raw export/import
//! - `CollectionTxn`: the typed view inside one engine transaction

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batch;
pub mod codec;
pub mod key;
pub mod model;
pub mod store;
pub mod txn;

pub use batch::{BatchEntry, WriteBatch};
pub use model::Model;
pub use store::{CollectionIter, CollectionStore};
pub use txn::CollectionTxn;
