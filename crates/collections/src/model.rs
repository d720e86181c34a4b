//! The `Model` capability

use serde::de::DeserializeOwned;
use serde::Serialize;

/// An entity that can be stored in a collection
///
/// # Example
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use seatbook_collections::Model;
///
/// #[derive(Serialize, Deserialize)]
/// struct Airport {
///     code: String,
/// }
///
/// impl Model for Airport {
///     const COLLECTION: &'static str = "airports";
///
///     fn key(&self) -> String {
///         self.code.clone()
///     }
/// }
/// ```
pub trait Model: Serialize + DeserializeOwned {
    /// Collection the entity lives in
    const COLLECTION: &'static str;

    /// Entity key within the collection
    ///
    /// May itself contain `/` to group entities under a sub-prefix.
    fn key(&self) -> String;
}
