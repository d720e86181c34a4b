//! Storage key construction
//!
//! `storage_key = collection + "/" + entity_key`. Sub-prefix scans end with
//! the separator, so the sub-prefix `"12"` never matches keys under `"123"`.

use seatbook_core::{Error, Key, Result};

/// Separator between collection, sub-prefix and entity key
pub const SEPARATOR: char = '/';

/// Full storage key for an entity
pub fn storage_key(collection: &str, entity_key: &str) -> Key {
    Key::from(format!("{}{}{}", collection, SEPARATOR, entity_key))
}

/// Scan prefix for a whole collection or one sub-prefix of it
pub fn scan_prefix(collection: &str, sub_prefix: Option<&str>) -> Key {
    match sub_prefix {
        Some(sub) => Key::from(format!(
            "{}{}{}{}",
            collection, SEPARATOR, sub, SEPARATOR
        )),
        None => Key::from(format!("{}{}", collection, SEPARATOR)),
    }
}

/// Entity key of a storage key inside `collection`
///
/// Returns `None` if the key belongs to another collection or is not UTF-8.
pub fn entity_key(collection: &str, key: &Key) -> Option<String> {
    key.as_str()?
        .strip_prefix(collection)?
        .strip_prefix(SEPARATOR)
        .map(str::to_string)
}

/// Split a storage key into `(collection, entity_key)`
pub fn split_storage_key(key: &str) -> Option<(&str, &str)> {
    let (collection, entity) = key.split_once(SEPARATOR)?;
    if collection.is_empty() || entity.is_empty() {
        return None;
    }
    Some((collection, entity))
}

/// Check that a collection name and entity key can form a storage key
pub fn validate(collection: &str, entity_key: &str) -> Result<()> {
    if collection.is_empty() || collection.contains(SEPARATOR) {
        return Err(Error::invalid_input(format!(
            "Invalid collection name '{}'",
            collection
        )));
    }
    if entity_key.is_empty() {
        return Err(Error::invalid_input(format!(
            "Empty entity key in collection '{}'",
            collection
        )));
    }
    Ok(())
}
