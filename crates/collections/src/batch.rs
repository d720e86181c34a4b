//! Multi-entity write batches
//!
//! A `WriteBatch` is built before entering a transaction and applied inside
//! it, so every entry becomes visible at once.

use seatbook_core::{Key, Result};

use crate::codec;
use crate::key;
use crate::model::Model;

/// One `(collection, key, payload)` entry of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    /// Collection name
    pub collection: String,
    /// Entity key within the collection
    pub key: String,
    /// Encoded payload
    pub payload: Vec<u8>,
}

impl BatchEntry {
    /// Full storage key of this entry
    pub fn storage_key(&self) -> Key {
        key::storage_key(&self.collection, &self.key)
    }
}

/// Ordered list of entries written in one transaction
///
/// A later entry for the same storage key overwrites an earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    entries: Vec<BatchEntry>,
}

impl WriteBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize a model and append it
    ///
    /// # Errors
    /// `Error::Serialization` if the model cannot be encoded,
    /// `Error::InvalidInput` if its key is empty.
    pub fn add<M: Model>(&mut self, model: &M) -> Result<&mut Self> {
        let payload = codec::encode(model)?;
        self.add_raw(M::COLLECTION, model.key(), payload)
    }

    /// Append an already-encoded payload
    pub fn add_raw(
        &mut self,
        collection: impl Into<String>,
        entity_key: impl Into<String>,
        payload: Vec<u8>,
    ) -> Result<&mut Self> {
        let collection = collection.into();
        let entity_key = entity_key.into();
        key::validate(&collection, &entity_key)?;
        self.entries.push(BatchEntry {
            collection,
            key: entity_key,
            payload,
        });
        Ok(self)
    }

    /// Build a batch holding a single model
    pub fn single<M: Model>(model: &M) -> Result<Self> {
        let mut batch = Self::new();
        batch.add(model)?;
        Ok(batch)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the batch has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order
    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, BatchEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a WriteBatch {
    type Item = &'a BatchEntry;
    type IntoIter = std::slice::Iter<'a, BatchEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
