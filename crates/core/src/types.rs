//! Storage key type
//!
//! A `Key` is an owned byte string. Keys order by raw byte comparison, which
//! is the order the engine iterates in. Collection layers build keys of the
//! form `collection/entity`, but nothing at this level interprets the bytes.

use std::fmt;

/// Raw byte key
///
/// The derived `Ord` is lexicographic over the bytes, so a `BTreeMap<Key, _>`
/// keeps every key sharing a prefix in one contiguous range.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Key(Vec<u8>);

impl Key {
    /// Create a key from raw bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Key(bytes.into())
    }

    /// Create a key from a UTF-8 string
    pub fn from_str_key(s: &str) -> Self {
        Key(s.as_bytes().to_vec())
    }

    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume the key, returning its bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Length of the key in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the key is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check if this key starts with the given prefix
    ///
    /// Every key starts with the empty prefix.
    ///
    /// # Example
    ///
    /// ```
    /// use seatbook_core::Key;
    ///
    /// let prefix = Key::from_str_key("seats/123/");
    /// assert!(Key::from_str_key("seats/123/A1").starts_with(&prefix));
    /// assert!(!Key::from_str_key("seats/1234/A1").starts_with(&prefix));
    /// ```
    pub fn starts_with(&self, prefix: &Key) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Interpret the key as UTF-8, if it is valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::from_str_key(s)
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key(s.into_bytes())
    }
}

impl From<Vec<u8>> for Key {
    fn from(bytes: Vec<u8>) -> Self {
        Key(bytes)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({:?})", String::from_utf8_lossy(&self.0))
    }
}
