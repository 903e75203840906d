use std::marker::PhantomData;

use crate::encoding::{Decode, Encode};
use crate::store::*;
use crate::Result;

const EMPTY_KEY: &[u8] = &[];

/// A singleton value stored at the root of its store prefix, automatically
/// decoding when getting and encoding when setting.
pub struct Value<T, S = DefaultBackingStore> {
    store: Store<S>,
    _marker: PhantomData<T>,
}

impl<T, S> Value<T, S> {
    pub fn new(store: Store<S>) -> Self {
        Value {
            store,
            _marker: PhantomData,
        }
    }
}

impl<T: Encode + Decode, S: Read> Value<T, S> {
    /// Gets the stored value, returning `None` if it does not yet exist.
    pub fn maybe_get(&self) -> Result<Option<T>> {
        match self.store.get(EMPTY_KEY)? {
            Some(bytes) => Ok(Some(T::decode(bytes.as_slice())?)),
            None => Ok(None),
        }
    }
}

impl<T: Encode + Decode, S: Write> Value<T, S> {
    pub fn set(&mut self, value: &T) -> Result<()> {
        let bytes = value.encode()?;
        self.store.put(EMPTY_KEY.to_vec(), bytes)
    }
}
