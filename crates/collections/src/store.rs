//! CollectionStore: typed collections over the engine
//!
//! ## Design
//!
//! CollectionStore is a stateless facade over the Engine. It holds no
//! in-memory state beyond an `Arc<Engine>` reference, so clones are cheap
//! and all share the same data.
//!
//! ## API
//!
//! - **Writes**: `put(batch)`, `put_one(model)`. Each call is one engine
//!   transaction; engine errors pass through unchanged.
//! - **Reads**: `get`, `find`, `get_raw`, `scan`, `keys`. Each read runs
//!   against one consistent snapshot.
//! - **Multi-Operation API**: `transaction` with `CollectionTxn`.
//! - **Persisted layout**: `export`, `import`, `write_raw_values` work on
//!   flat `(storage_key, payload)` pairs without decoding.

use std::io::Write;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, info};

use seatbook_core::{Error, Key, Result, SnapshotView};
use seatbook_engine::Engine;
use seatbook_storage::PrefixIter;

use crate::batch::WriteBatch;
use crate::codec;
use crate::key;
use crate::model::Model;
use crate::txn::CollectionTxn;

/// Typed collection store
///
/// # Example
///
/// ```ignore
/// let store = CollectionStore::new(Engine::open()?);
/// store.put_one(&flight)?;
/// let same: Flight = store.get(&flight.id)?;
/// for seat in store.scan::<Seat>(Some(flight.id.as_str()))? {
///     println!("{}", seat?.seat);
/// }
/// ```
#[derive(Clone)]
pub struct CollectionStore {
    engine: Arc<Engine>,
}

impl std::fmt::Debug for CollectionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionStore")
            .field("engine", &self.engine)
            .finish()
    }
}

impl CollectionStore {
    /// Create a store over an engine
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    /// The underlying engine
    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    // ========== Writes ==========

    /// Write every entry of a batch in one transaction
    pub fn put(&self, batch: &WriteBatch) -> Result<()> {
        self.transaction(|txn| txn.put_batch(batch))?;
        debug!(target: "seatbook::store", entries = batch.len(), "Batch written");
        Ok(())
    }

    /// Write a single model
    pub fn put_one<M: Model>(&self, model: &M) -> Result<()> {
        self.put(&WriteBatch::single(model)?)
    }

    // ========== Reads ==========

    /// Get an entity
    ///
    /// # Errors
    /// `Error::NotFound` if absent, `Error::Deserialization` if the payload
    /// does not decode into `T`.
    pub fn get<T: Model>(&self, entity_key: &str) -> Result<T> {
        self.find(entity_key)?
            .ok_or_else(|| Error::not_found(T::COLLECTION, entity_key))
    }

    /// Get an entity if present
    pub fn find<T: Model>(&self, entity_key: &str) -> Result<Option<T>> {
        let storage_key = key::storage_key(T::COLLECTION, entity_key);
        match self.engine.snapshot()?.get(&storage_key)? {
            Some(vv) => codec::decode(&storage_key, &vv.value).map(Some),
            None => Ok(None),
        }
    }

    /// Raw payload bytes of an entry, without decoding
    pub fn get_raw(&self, collection: &str, entity_key: &str) -> Result<Vec<u8>> {
        let storage_key = key::storage_key(collection, entity_key);
        self.engine
            .snapshot()?
            .get(&storage_key)?
            .map(|vv| vv.value)
            .ok_or_else(|| Error::not_found(collection, entity_key))
    }

    /// Lazily iterate the entities of a collection, or of one sub-prefix
    ///
    /// The iterator reads one consistent snapshot taken by this call and
    /// yields entities in key order. Each item decodes on demand.
    pub fn scan<T: Model>(&self, sub_prefix: Option<&str>) -> Result<CollectionIter<T>> {
        let prefix = key::scan_prefix(T::COLLECTION, sub_prefix);
        let snapshot = self.engine.snapshot()?;
        Ok(CollectionIter {
            inner: snapshot.iter_prefix(&prefix),
            _marker: PhantomData,
        })
    }

    /// Entity keys of a collection, in key order
    pub fn keys(&self, collection: &str) -> Result<Vec<String>> {
        let prefix = key::scan_prefix(collection, None);
        Ok(self
            .engine
            .snapshot()?
            .iter_prefix(&prefix)
            .filter_map(|(k, _)| key::entity_key(collection, &k))
            .collect())
    }

    /// Stream every raw payload of a collection as one JSON array
    ///
    /// Payloads are copied verbatim, so the output is valid JSON as long as
    /// every payload is. Returns the number of entries written.
    pub fn write_raw_values<W: Write>(&self, collection: &str, mut writer: W) -> Result<usize> {
        let prefix = key::scan_prefix(collection, None);
        let snapshot = self.engine.snapshot()?;

        let mut count = 0;
        writer.write_all(b"[")?;
        for (_, vv) in snapshot.iter_prefix(&prefix) {
            if count > 0 {
                writer.write_all(b",")?;
            }
            writer.write_all(&vv.value)?;
            count += 1;
        }
        writer.write_all(b"]")?;
        writer.flush()?;
        Ok(count)
    }

    // ========== Persisted layout ==========

    /// Every stored `(storage_key, payload)` pair, in key order
    pub fn export(&self) -> Result<Vec<(String, Vec<u8>)>> {
        Ok(self
            .engine
            .snapshot()?
            .iter_prefix(&Key::default())
            .map(|(k, vv)| (k.to_string(), vv.value))
            .collect())
    }

    /// Load `(storage_key, payload)` pairs in one transaction
    ///
    /// Either every pair is written or none is. Returns the number of pairs.
    ///
    /// # Errors
    /// `Error::InvalidInput` if a key is not `collection/entity_key`.
    pub fn import<I>(&self, pairs: I) -> Result<usize>
    where
        I: IntoIterator<Item = (String, Vec<u8>)>,
    {
        let mut batch = WriteBatch::new();
        for (storage_key, payload) in pairs {
            let (collection, entity_key) = key::split_storage_key(&storage_key)
                .ok_or_else(|| {
                    Error::invalid_input(format!("Malformed storage key '{}'", storage_key))
                })?;
            batch.add_raw(collection, entity_key, payload)?;
        }

        self.put(&batch)?;
        info!(target: "seatbook::store", entries = batch.len(), "Import complete");
        Ok(batch.len())
    }

    // ========== Transactions ==========

    /// Run `f` inside one engine transaction with a typed view
    ///
    /// Commits if `f` returns `Ok`; otherwise nothing is written.
    pub fn transaction<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut CollectionTxn<'_>) -> std::result::Result<T, E>,
        E: From<Error>,
    {
        self.engine.transaction(|txn| {
            let mut collection_txn = CollectionTxn::new(txn);
            f(&mut collection_txn)
        })
    }
}

/// Lazy iterator over the entities of one collection prefix
///
/// Yields `Result<T>`: an entry whose payload does not decode yields
/// `Error::Deserialization` and iteration can continue past it.
pub struct CollectionIter<T> {
    inner: PrefixIter,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Model> Iterator for CollectionIter<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(k, vv)| codec::decode(&k, &vv.value))
    }
}
