//! Low-level key/value store abstraction.
//!
//! Every entity the oracle persists lives behind these traits. Reads and
//! writes are immediately visible to later operations in the same block;
//! there is no staging layer between the collections and the backing store.

use crate::Result;

mod iter;
mod mapstore;
mod share;
#[allow(clippy::module_inception)]
mod store;

pub use iter::Iter;
pub use mapstore::MapStore;
pub use share::Shared;
pub use store::{DefaultBackingStore, Store};

/// A key/value entry.
pub type KV = (Vec<u8>, Vec<u8>);

/// Trait for read access to key/value stores.
pub trait Read {
    /// Gets a value by key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Gets the first entry whose key is strictly greater than `key`.
    fn get_next(&self, key: &[u8]) -> Result<Option<KV>>;

    /// Gets the last entry whose key is strictly less than `key`, or the last
    /// entry in the store if `key` is `None`.
    fn get_prev(&self, key: Option<&[u8]>) -> Result<Option<KV>>;

    #[inline]
    fn contains(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Trait for write access to key/value stores.
pub trait Write {
    /// Writes a key and value to the store.
    ///
    /// If a value already exists for the given key, the implementor should
    /// overwrite the value.
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()>;

    /// Deletes the value with the given key.
    ///
    /// If no value exists for the given key, the implementor should treat the
    /// operation as a no-op (but may still issue a call to `delete` to an
    /// underlying store).
    fn delete(&mut self, key: &[u8]) -> Result<()>;
}
