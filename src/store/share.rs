use super::{Read, Write, KV};
use crate::Result;
use std::cell::RefCell;
use std::rc::Rc;

/// A shared reference to a store, allowing the store to be cloned and read
/// from or written to by multiple consumers.
///
/// `Shared` has the `Clone` trait - it is safe to clone because operations
/// on the underlying store never overlap. Block execution is single-threaded
/// so there is no locking.
pub struct Shared<T>(Rc<RefCell<T>>);

impl<T> Shared<T> {
    /// Constructs a `Shared` by wrapping the given store.
    pub fn new(inner: T) -> Self {
        Shared(Rc::new(RefCell::new(inner)))
    }

    /// Runs `f` with an immutable borrow of the inner value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.0.borrow())
    }

    /// Runs `f` with a mutable borrow of the inner value.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Shared<T> {
        Self(self.0.clone())
    }
}

impl<T: Default> Default for Shared<T> {
    fn default() -> Self {
        Shared::new(T::default())
    }
}

impl<R: Read> Read for Shared<R> {
    #[inline]
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.0.borrow().get(key)
    }

    #[inline]
    fn get_next(&self, key: &[u8]) -> Result<Option<KV>> {
        self.0.borrow().get_next(key)
    }

    #[inline]
    fn get_prev(&self, key: Option<&[u8]>) -> Result<Option<KV>> {
        self.0.borrow().get_prev(key)
    }
}

impl<W: Write> Write for Shared<W> {
    #[inline]
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        self.0.borrow_mut().put(key, value)
    }

    #[inline]
    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.0.borrow_mut().delete(key)
    }
}
