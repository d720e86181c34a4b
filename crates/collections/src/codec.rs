//! JSON payload codec
//!
//! Decoding is generic over the target type; the caller names the type at
//! compile time.

use serde::de::DeserializeOwned;
use serde::Serialize;

use seatbook_core::{Error, Key, Result};

/// Encode an entity as a JSON payload
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| Error::Serialization(e.to_string()))
}

/// Decode a JSON payload stored at `key`
pub fn decode<T: DeserializeOwned>(key: &Key, payload: &[u8]) -> Result<T> {
    serde_json::from_slice(payload).map_err(|e| Error::Deserialization {
        key: key.to_string(),
        message: e.to_string(),
    })
}
