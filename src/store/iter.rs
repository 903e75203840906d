use super::{Read, KV};
use crate::Result;

/// An iterator over the entries of a store, in ascending or descending key
/// order. Each step reads through to the store, so entries written during
/// iteration ahead of the cursor are observed.
pub struct Iter<'a, S> {
    store: &'a S,
    cursor: Option<Vec<u8>>,
    reverse: bool,
    done: bool,
}

impl<'a, S: Read> Iter<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Iter {
            store,
            cursor: None,
            reverse: false,
            done: false,
        }
    }

    pub fn new_rev(store: &'a S) -> Self {
        Iter {
            store,
            cursor: None,
            reverse: true,
            done: false,
        }
    }
}

impl<'a, S: Read> Iterator for Iter<'a, S> {
    type Item = Result<KV>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let entry = match (self.reverse, self.cursor.as_deref()) {
            (false, cursor) => self.store.get_next(cursor.unwrap_or(&[])),
            (true, cursor) => self.store.get_prev(cursor),
        };

        match entry {
            Ok(Some((key, value))) => {
                self.cursor = Some(key.clone());
                Some(Ok((key, value)))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
