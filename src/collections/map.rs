use std::marker::PhantomData;

use crate::encoding::{Decode, Encode, Terminated};
use crate::store::*;
use crate::Result;

/// A map collection which stores data in a backing key/value store.
///
/// Keys are encoded into bytes and values are stored at the resulting key.
/// Because key encodings are order-preserving, iteration yields entries in
/// ascending key order (lexicographic for strings and addresses, numeric for
/// integers), which is the canonical order for anything derived from the
/// map's contents.
///
/// Writes go straight to the backing store and are visible to every other
/// handle on the same store immediately.
pub struct Map<K, V, S = DefaultBackingStore> {
    store: Store<S>,
    _marker: PhantomData<(K, V)>,
}

impl<K, V, S> Map<K, V, S> {
    pub fn new(store: Store<S>) -> Self {
        Map {
            store,
            _marker: PhantomData,
        }
    }
}

impl<K, V, S> Map<K, V, S>
where
    K: Encode + Decode + Terminated,
    V: Encode + Decode,
    S: Read,
{
    /// Gets the value for the given key, or `None` if the key has no value.
    pub fn get(&self, key: &K) -> Result<Option<V>> {
        let key_bytes = key.encode()?;
        match self.store.get(key_bytes.as_slice())? {
            Some(value_bytes) => Ok(Some(V::decode(value_bytes.as_slice())?)),
            None => Ok(None),
        }
    }

    pub fn contains_key(&self, key: &K) -> Result<bool> {
        let key_bytes = key.encode()?;
        self.store.contains(key_bytes.as_slice())
    }

    /// Iterates over all entries in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = Result<(K, V)>> + '_ {
        Iter::new(&self.store).map(decode_entry::<K, V>)
    }

    /// Iterates over all entries in descending key order.
    pub fn iter_rev(&self) -> impl Iterator<Item = Result<(K, V)>> + '_ {
        Iter::new_rev(&self.store).map(decode_entry::<K, V>)
    }

    /// Collects all keys in ascending order.
    pub fn keys(&self) -> Result<Vec<K>> {
        self.iter().map(|res| res.map(|(key, _)| key)).collect()
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.store.get_next(&[])?.is_none())
    }
}

impl<K, V, S> Map<K, V, S>
where
    K: Encode + Decode + Terminated,
    V: Encode + Decode,
    S: Read + Write,
{
    /// Inserts a value, overwriting any existing value for the key.
    pub fn insert(&mut self, key: K, value: V) -> Result<()> {
        let key_bytes = key.encode()?;
        let value_bytes = value.encode()?;
        self.store.put(key_bytes, value_bytes)
    }

    /// Removes the value at the given key, returning it if it existed.
    pub fn remove(&mut self, key: &K) -> Result<Option<V>> {
        let existing = self.get(key)?;
        if existing.is_some() {
            let key_bytes = key.encode()?;
            self.store.delete(key_bytes.as_slice())?;
        }
        Ok(existing)
    }

    /// Removes every entry in the map.
    pub fn clear(&mut self) -> Result<()> {
        // TODO: delete while iterating once the store exposes a range delete
        let to_delete = Iter::new(&self.store)
            .map(|res| res.map(|(key, _)| key))
            .collect::<Result<Vec<_>>>()?;
        for key in to_delete {
            self.store.delete(key.as_slice())?;
        }
        Ok(())
    }
}

fn decode_entry<K: Decode, V: Decode>(entry: Result<KV>) -> Result<(K, V)> {
    let (key_bytes, value_bytes) = entry?;
    Ok((
        K::decode(key_bytes.as_slice())?,
        V::decode(value_bytes.as_slice())?,
    ))
}
