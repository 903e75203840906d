use super::*;
use std::collections::BTreeMap;
use std::ops::Bound;

/// A simple `Store` implementation which persists data in an in-memory
/// `BTreeMap`.
#[derive(Default, Clone)]
pub struct MapStore {
    map: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MapStore {
    /// Constructs a `MapStore` containing no entries.
    #[inline]
    pub fn new() -> Self {
        Default::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Read for MapStore {
    #[inline]
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.map.get(key).cloned())
    }

    #[inline]
    fn get_next(&self, key: &[u8]) -> Result<Option<KV>> {
        Ok(self
            .map
            .range::<[u8], _>((Bound::Excluded(key), Bound::Unbounded))
            .next()
            .map(|(k, v)| (k.clone(), v.clone())))
    }

    #[inline]
    fn get_prev(&self, key: Option<&[u8]>) -> Result<Option<KV>> {
        let upper = match key {
            Some(key) => Bound::Excluded(key),
            None => Bound::Unbounded,
        };
        Ok(self
            .map
            .range::<[u8], _>((Bound::Unbounded, upper))
            .next_back()
            .map(|(k, v)| (k.clone(), v.clone())))
    }
}

impl Write for MapStore {
    #[inline]
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        self.map.insert(key, value);
        Ok(())
    }

    #[inline]
    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.map.remove(key);
        Ok(())
    }
}
