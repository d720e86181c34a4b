//! Typed view of one engine transaction

use seatbook_core::{Error, Result};
use seatbook_engine::TransactionContext;

use crate::batch::WriteBatch;
use crate::codec;
use crate::key;
use crate::model::Model;

/// Transaction handle for typed collection operations
///
/// Reads are recorded for commit-time validation; writes stay private until
/// the enclosing `CollectionStore::transaction` commits.
pub struct CollectionTxn<'a> {
    txn: &'a mut TransactionContext,
}

impl<'a> CollectionTxn<'a> {
    pub(crate) fn new(txn: &'a mut TransactionContext) -> Self {
        Self { txn }
    }

    /// Get an entity, failing with `Error::NotFound` if absent
    pub fn get<T: Model>(&mut self, entity_key: &str) -> Result<T> {
        self.find(entity_key)?
            .ok_or_else(|| Error::not_found(T::COLLECTION, entity_key))
    }

    /// Get an entity if present
    pub fn find<T: Model>(&mut self, entity_key: &str) -> Result<Option<T>> {
        let storage_key = key::storage_key(T::COLLECTION, entity_key);
        match self.txn.get(&storage_key)? {
            Some(payload) => codec::decode(&storage_key, &payload).map(Some),
            None => Ok(None),
        }
    }

    /// All entities of a collection, or of one sub-prefix, in key order
    ///
    /// Includes this transaction's own buffered writes. The scanned range is
    /// part of the read-set: if another transaction commits a new entity under
    /// it first, this transaction fails to commit with `EngineConflict`.
    pub fn scan<T: Model>(&mut self, sub_prefix: Option<&str>) -> Result<Vec<T>> {
        let prefix = key::scan_prefix(T::COLLECTION, sub_prefix);
        self.txn
            .scan_prefix(&prefix)?
            .into_iter()
            .map(|(k, payload)| codec::decode(&k, &payload))
            .collect()
    }

    /// Buffer every entry of a batch
    pub fn put_batch(&mut self, batch: &WriteBatch) -> Result<()> {
        for entry in batch {
            self.txn.put(entry.storage_key(), entry.payload.clone())?;
        }
        Ok(())
    }

    /// Buffer a single model
    pub fn put<M: Model>(&mut self, model: &M) -> Result<()> {
        self.put_batch(&WriteBatch::single(model)?)
    }
}
