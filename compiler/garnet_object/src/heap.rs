//! Heap wrapper for guest objects.
//!
//! `Heap<T>` wraps `Rc<T>`. Guest code runs on one thread, so reference
//! counting does not need to be atomic. Object identity is allocation
//! identity: two handles denote the same guest object iff
//! [`Heap::ptr_eq`] holds.

use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

/// A reference-counted guest allocation.
#[repr(transparent)]
pub struct Heap<T: ?Sized>(Rc<T>);

impl<T> Heap<T> {
    /// Allocate a new value.
    ///
    /// Crate-private: hosts go through `Value` factories and the runtime's
    /// definition helpers.
    #[inline]
    pub(crate) fn new(value: T) -> Self {
        Heap(Rc::new(value))
    }
}

impl<T: ?Sized> Heap<T> {
    /// Whether both handles point at the same allocation.
    #[inline]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Rc::ptr_eq(&this.0, &other.0)
    }

    /// Address of the allocation, used for `object_id` and `#<Foo:0x...>`.
    #[inline]
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0).cast::<()>() as usize
    }
}

impl<T: ?Sized> Deref for Heap<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized> Clone for Heap<T> {
    #[inline]
    fn clone(&self) -> Self {
        Heap(Rc::clone(&self.0))
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Heap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}
