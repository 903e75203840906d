use super::{MapStore, Read, Shared, Write, KV};
use crate::Result;

pub type DefaultBackingStore = MapStore;

/// A prefixed view over a shared backing store.
///
/// Every key read or written through a `Store` is prepended with its prefix,
/// and `sub` creates a nested view with a longer prefix. Iteration through
/// `get_next`/`get_prev` never escapes the prefix.
pub struct Store<S = DefaultBackingStore> {
    prefix: Vec<u8>,
    store: Shared<S>,
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Store {
            prefix: self.prefix.clone(),
            store: self.store.clone(),
        }
    }
}

impl<S> Store<S> {
    #[inline]
    pub fn new(inner: Shared<S>) -> Self {
        Store {
            prefix: vec![],
            store: inner,
        }
    }

    #[inline]
    pub fn sub(&self, key: &[u8]) -> Self {
        Store {
            prefix: concat(self.prefix.as_slice(), key),
            store: self.store.clone(),
        }
    }

    /// Strips the prefix from an entry of the backing store, or returns `None`
    /// if the entry lies outside of this view.
    fn unprefix(&self, entry: Option<KV>) -> Option<KV> {
        entry.and_then(|(key, value)| {
            if key.starts_with(self.prefix.as_slice()) {
                Some((key[self.prefix.len()..].to_vec(), value))
            } else {
                None
            }
        })
    }
}

impl<S: Read> Read for Store<S> {
    #[inline]
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let prefixed = concat(self.prefix.as_slice(), key);
        self.store.get(prefixed.as_slice())
    }

    #[inline]
    fn get_next(&self, key: &[u8]) -> Result<Option<KV>> {
        let prefixed = concat(self.prefix.as_slice(), key);
        let entry = self.store.get_next(prefixed.as_slice())?;
        Ok(self.unprefix(entry))
    }

    #[inline]
    fn get_prev(&self, key: Option<&[u8]>) -> Result<Option<KV>> {
        let entry = match key {
            Some(key) => {
                let prefixed = concat(self.prefix.as_slice(), key);
                self.store.get_prev(Some(prefixed.as_slice()))?
            }
            None => match prefix_end(self.prefix.as_slice()) {
                Some(end) => self.store.get_prev(Some(end.as_slice()))?,
                None => self.store.get_prev(None)?,
            },
        };
        Ok(self.unprefix(entry))
    }
}

impl<S: Write> Write for Store<S> {
    #[inline]
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        let prefixed = concat(self.prefix.as_slice(), key.as_slice());
        self.store.put(prefixed, value)
    }

    #[inline]
    fn delete(&mut self, key: &[u8]) -> Result<()> {
        let prefixed = concat(self.prefix.as_slice(), key);
        self.store.delete(prefixed.as_slice())
    }
}

#[inline]
fn concat(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut value = Vec::with_capacity(a.len() + b.len());
    value.extend_from_slice(a);
    value.extend_from_slice(b);
    value
}

/// Returns the smallest key greater than every key starting with `prefix`,
/// or `None` if no such key exists (empty or all-`0xff` prefix).
fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_store_is_isolated() -> Result<()> {
        let store = Store::new(Shared::new(MapStore::new()));
        let mut a = store.sub(&[1]);
        let mut b = store.sub(&[2]);

        a.put(vec![1], vec![10])?;
        a.put(vec![2], vec![20])?;
        b.put(vec![1], vec![30])?;

        assert_eq!(a.get(&[1])?, Some(vec![10]));
        assert_eq!(b.get(&[1])?, Some(vec![30]));
        assert_eq!(store.get(&[2, 1])?, Some(vec![30]));

        assert_eq!(a.get_next(&[])?, Some((vec![1], vec![10])));
        assert_eq!(a.get_next(&[2])?, None);
        assert_eq!(a.get_prev(None)?, Some((vec![2], vec![20])));
        assert_eq!(b.get_prev(Some(&[1]))?, None);

        Ok(())
    }

    #[test]
    fn prefix_end_carries() {
        assert_eq!(prefix_end(&[1, 2]), Some(vec![1, 3]));
        assert_eq!(prefix_end(&[1, 255]), Some(vec![2]));
        assert_eq!(prefix_end(&[255, 255]), None);
        assert_eq!(prefix_end(&[]), None);
    }
}
