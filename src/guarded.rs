//! Reentrant-safe mutual exclusion around an arbitrary value.
//!
//! This module provides [`GuardedState<T>`], a small wrapper that serializes
//! every read and mutation of a value across threads while tolerating nested
//! use from the thread that already holds the exclusion. It is the primitive
//! the cache cell builds its state machine on, but it is deliberately generic
//! and has no knowledge of loading semantics.
//!
//! The wrapper combines a reentrant lock with interior mutability: the lock
//! admits the owning thread again without blocking, and the dynamic borrow of
//! the value is scoped strictly to the body of a single [`read`] or [`mutate`]
//! call. Compound critical sections use [`enter`], which holds the exclusion
//! across a block whose body issues its own `read`/`mutate` calls.
//!
//! [`read`]: GuardedState::read
//! [`mutate`]: GuardedState::mutate
//! [`enter`]: GuardedState::enter

use core::cell::RefCell;
use core::fmt;

use parking_lot::ReentrantMutex;

/// A value accessible only through serialized, reentrancy-tolerant access.
///
/// All reads and mutations are mutually exclusive across threads. The owning
/// thread may re-acquire the exclusion at any depth (from inside an [`enter`]
/// section, or from a callback invoked between operations) without
/// deadlocking.
///
/// Sharing a `GuardedState<T>` across threads requires only `T: Send`; the
/// exclusion guarantees the value is never touched by two threads at once.
///
/// [`enter`]: GuardedState::enter
pub struct GuardedState<T> {
   inner: ReentrantMutex<RefCell<T>>,
}

impl<T> GuardedState<T> {
   /// Creates a new `GuardedState` holding `value`.
   #[inline]
   #[must_use]
   pub fn new(value: T) -> Self {
      Self {
         inner: ReentrantMutex::new(RefCell::new(value)),
      }
   }

   /// Returns a snapshot of the value under exclusive access.
   ///
   /// The clone is taken while the exclusion is held; concurrent mutations are
   /// observed either fully before or fully after the snapshot, never partially.
   #[inline]
   pub fn read(&self) -> T
   where
      T: Clone,
   {
      let guard = self.inner.lock();
      let snapshot = guard.borrow().clone();
      snapshot
   }

   /// Runs `transform` with exclusive mutable access and returns its result.
   ///
   /// The mutation is serialized with respect to every other `read`/`mutate`
   /// on this `GuardedState`.
   ///
   /// # Panics
   ///
   /// `transform` must not call back into the same `GuardedState`: the value's
   /// borrow is live for the duration of the closure, and a nested access is a
   /// dynamic-borrow violation rather than a deadlock. Reentrant access
   /// belongs *between* operations, inside an [`enter`](Self::enter) section.
   #[inline]
   pub fn mutate<R, F>(&self, transform: F) -> R
   where
      F: FnOnce(&mut T) -> R,
   {
      let guard = self.inner.lock();
      let result = transform(&mut *guard.borrow_mut());
      result
   }

   /// Holds the exclusion across a compound critical section.
   ///
   /// `section` runs with the lock held but no borrow of the value active, so
   /// its body may issue any number of `read`/`mutate`/`enter` calls on this
   /// same `GuardedState` (including from callbacks it invokes) while other
   /// threads remain fully excluded until it returns.
   #[inline]
   pub fn enter<R, F>(&self, section: F) -> R
   where
      F: FnOnce() -> R,
   {
      let _guard = self.inner.lock();
      section()
   }

   /// Consumes the wrapper and returns the inner value.
   ///
   /// Taking `self` by value guarantees no other access can exist, so this
   /// never blocks.
   #[inline]
   pub fn into_inner(self) -> T {
      self.inner.into_inner().into_inner()
   }
}

// --- Trait Implementations ---

impl<T: Default> Default for GuardedState<T> {
   /// Creates a `GuardedState` holding `T::default()`.
   #[inline]
   fn default() -> Self {
      Self::new(T::default())
   }
}

impl<T: fmt::Debug> fmt::Debug for GuardedState<T> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      let mut d = f.debug_tuple("GuardedState");
      match self.inner.try_lock() {
         Some(guard) => match guard.try_borrow() {
            Ok(value) => d.field(&*value),
            Err(_) => d.field(&format_args!("<borrowed>")),
         },
         None => d.field(&format_args!("<locked>")),
      };
      d.finish()
   }
}
