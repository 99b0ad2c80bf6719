//! Lazily-loaded, request-coalescing single-value cache.
//!
//! This module provides [`LazyAsyncCell<V, E>`], a thread-safe slot that holds
//! the result of an asynchronous load. The slot starts empty, populates itself
//! through a user-supplied loader the first time a caller asks for the value,
//! and from then on serves the stored result (success or failure) until it
//! is explicitly cleared.
//!
//! The interesting part is what happens while the load is in flight: every
//! caller that arrives during that window is queued. The loader runs exactly
//! once, and its single result is fanned out to the whole queue in
//! registration order. Loads are never retried implicitly; a stored failure is
//! replayed to later callers until [`reset`](LazyAsyncCell::reset) or
//! [`reload`](LazyAsyncCell::reload) opens a new loading episode.
//!
//! The loader itself always runs on a freshly spawned thread. Dispatching it
//! inline would let a loader that completes synchronously drive the cell's
//! completion path from a stack that is still mid-transition, so the hand-off
//! is unconditional, regardless of how the loader behaves.

use core::fmt;
use std::mem;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

#[cfg(feature = "async-tokio")]
use core::future::Future;

use crate::guarded::GuardedState;
use crate::log::debug_log;

/// A queued continuation awaiting a cell's result.
///
/// The `FnOnce` bound is load-bearing: a completion handle can be invoked at
/// most once, so a loader physically cannot deliver two results for the same
/// episode.
pub type Completion<V, E> = Box<dyn FnOnce(Result<V, E>) + Send>;

type Loader<V, E> = Box<dyn Fn(Completion<V, E>) + Send + Sync>;

/// The three phases of the slot. Exactly one is active at any instant.
enum LoadState<V, E> {
   /// No value and no load in flight.
   Empty,
   /// A loader invocation is in flight; consumers queue up.
   Loading,
   /// Terminal until an explicit `reset`/`reload`.
   Loaded(Result<V, E>),
}

/// State machine guts: the phase and the queue of waiting consumers.
///
/// `consumers` is non-empty only while `state` is `Loading`; the completion
/// path takes the whole queue in the same mutation that stores the result.
struct Core<V, E> {
   state: LoadState<V, E>,
   consumers: Vec<Completion<V, E>>,
}

struct Shared<V, E> {
   core: GuardedState<Core<V, E>>,
   loader: Loader<V, E>,
}

impl<V, E> Shared<V, E>
where
   V: Clone + Send + 'static,
   E: Clone + Send + 'static,
{
   /// Completion path for a loading episode. Runs on whatever thread the
   /// loader invoked its completion handle from.
   fn complete(&self, result: Result<V, E>) {
      self.core.enter(|| {
         // Store the result and take the queue in one mutation. The lock stays
         // held through the drain below, so no other thread can observe the
         // Loaded state before every queued consumer has been notified.
         let consumers = self.core.mutate(|core| {
            core.state = LoadState::Loaded(result.clone());
            mem::take(&mut core.consumers)
         });
         debug_log!("load finished, notifying {} queued consumers", consumers.len());
         // Consumers run with no borrow of the state active, so a callback may
         // re-enter the cell (get/reset/reload) from this thread and find the
         // result already stored.
         for consumer in consumers {
            consumer(result.clone());
         }
      });
   }
}

/// A thread-safe, lazily-populated single-value cache.
///
/// The cell is constructed around a *loader*: a capability that, handed a
/// [`Completion`], eventually invokes it exactly once with a success value or
/// an error. The cell guarantees:
///
/// - At most one loader invocation is in flight per cell at any time.
/// - Every consumer registered during a loading episode is invoked exactly
///   once, in registration order, with that episode's result.
/// - A stored result (including a stored failure) is served to later callers
///   without re-invoking the loader, until [`reset`](Self::reset) or
///   [`reload`](Self::reload).
///
/// `LazyAsyncCell` is a handle: [`Clone`] produces a second handle to the
/// *same* slot, which is how the cell is shared across threads and tasks.
pub struct LazyAsyncCell<V, E> {
   shared: Arc<Shared<V, E>>,
}

impl<V, E> LazyAsyncCell<V, E>
where
   V: Clone + Send + 'static,
   E: Clone + Send + 'static,
{
   /// Creates an empty cell around `loader`.
   ///
   /// Nothing runs until the first [`get`](Self::get) or
   /// [`load`](Self::load). Each loading episode invokes `loader` once, on a
   /// dedicated thread, with a fresh [`Completion`] handle.
   ///
   /// The loader must eventually invoke that handle. Invoking it more than
   /// once is unrepresentable (the handle is consumed by the call); dropping
   /// it without invoking it leaves every queued consumer waiting forever, and
   /// a panic inside the loader has the same effect.
   #[must_use]
   pub fn new<L>(loader: L) -> Self
   where
      L: Fn(Completion<V, E>) + Send + Sync + 'static,
   {
      Self {
         shared: Arc::new(Shared {
            core: GuardedState::new(Core {
               state: LoadState::Empty,
               consumers: Vec::new(),
            }),
            loader: Box::new(loader),
         }),
      }
   }

   /// Creates an empty cell whose loader is an async closure.
   ///
   /// Each loading episode calls `load` and spawns the returned future on the
   /// Tokio runtime that was current when the cell was constructed; the
   /// future's output feeds the ordinary completion machinery.
   ///
   /// # Panics
   ///
   /// Panics if called outside a Tokio runtime context.
   #[cfg(feature = "async-tokio")]
   #[must_use]
   pub fn from_future<L, Fut>(load: L) -> Self
   where
      L: Fn() -> Fut + Send + Sync + 'static,
      Fut: Future<Output = Result<V, E>> + Send + 'static,
   {
      let handle = tokio::runtime::Handle::current();
      Self::new(move |complete| {
         let future = load();
         handle.spawn(async move {
            complete(future.await);
         });
      })
   }

   /// Registers `on_complete` to receive the cell's result.
   ///
   /// - If a result is stored, `on_complete` is invoked synchronously with it;
   ///   the loader is not touched.
   /// - If a load is in flight, `on_complete` joins the queue for that
   ///   episode's result.
   /// - If the cell is empty, `on_complete` joins the queue and a new loading
   ///   episode starts.
   ///
   /// Every registered consumer is invoked exactly once, eventually, assuming
   /// the loader honors its contract. Queued consumers run on the thread the
   /// loader completes from and may call back into the cell.
   pub fn get<F>(&self, on_complete: F)
   where
      F: FnOnce(Result<V, E>) + Send + 'static,
   {
      let mut pending = Some(Box::new(on_complete) as Completion<V, E>);
      self.shared.core.enter(|| {
         let mut begin = false;
         let ready = self.shared.core.mutate(|core| match core.state {
            LoadState::Loaded(ref result) => Some(result.clone()),
            LoadState::Loading => {
               if let Some(consumer) = pending.take() {
                  core.consumers.push(consumer);
               }
               None
            }
            LoadState::Empty => {
               begin = true;
               if let Some(consumer) = pending.take() {
                  core.consumers.push(consumer);
               }
               None
            }
         });
         if let Some(result) = ready {
            if let Some(consumer) = pending.take() {
               consumer(result);
            }
         } else if begin {
            self.begin_load();
         }
      });
   }

   /// Waits for the cell's result, suspending the calling task.
   ///
   /// A thin adapter over [`get`](Self::get): the state machine is unchanged,
   /// and concurrent callers still coalesce onto a single loader invocation.
   ///
   /// # Panics
   ///
   /// Panics if every handle to the cell is dropped before the result is
   /// delivered.
   #[cfg(feature = "async-tokio")]
   pub async fn get_async(&self) -> Result<V, E> {
      let (tx, rx) = tokio::sync::oneshot::channel();
      self.get(move |result| {
         let _ = tx.send(result);
      });
      match rx.await {
         Ok(result) => result,
         Err(_) => panic!("LazyAsyncCell dropped while a caller was awaiting its value"),
      }
   }

   /// Waits for the cell's result, blocking the calling thread.
   ///
   /// The blocking counterpart of [`get_async`](Self::get_async). Do not call
   /// this from inside a consumer callback while a load is in flight: the
   /// callback runs on the thread that holds the cell's exclusion, and parking
   /// that thread would stall the very completion it is waiting on.
   ///
   /// # Panics
   ///
   /// Panics if every handle to the cell is dropped before the result is
   /// delivered.
   pub fn get_blocking(&self) -> Result<V, E> {
      let (tx, rx) = mpsc::channel();
      self.get(move |result| {
         let _ = tx.send(result);
      });
      match rx.recv() {
         Ok(result) => result,
         Err(_) => panic!("LazyAsyncCell dropped while a caller was waiting for its value"),
      }
   }

   /// Starts a loading episode if the cell is empty; otherwise does nothing.
   ///
   /// Idempotent and safe to call repeatedly or concurrently; at most one
   /// episode starts.
   pub fn load(&self) {
      self.shared.core.enter(|| self.begin_load());
   }

   /// Discards a stored result, returning the cell to empty.
   ///
   /// The next `get`/`load` runs a fresh loading episode. Does nothing while
   /// the cell is empty or a load is in flight; an in-flight episode always
   /// runs to completion and delivers to its queued consumers.
   pub fn reset(&self) {
      self.shared.core.mutate(|core| {
         if let LoadState::Loaded(_) = core.state {
            core.state = LoadState::Empty;
            debug_log!("stored result discarded");
         }
      });
   }

   /// Discards a stored result and immediately starts a fresh loading episode.
   ///
   /// Equivalent to [`reset`](Self::reset) followed by [`load`](Self::load),
   /// except the two steps are atomic: no concurrent caller can observe the
   /// cell empty in between, so a racing `get` joins the new episode instead
   /// of starting one of its own. Does nothing while a load is already in
   /// flight; from an empty cell it behaves like `load`.
   pub fn reload(&self) {
      self.shared.core.enter(|| {
         let begin = self.shared.core.mutate(|core| match core.state {
            LoadState::Loading => {
               debug_log!("reload ignored, load already in flight");
               false
            }
            LoadState::Loaded(_) => {
               core.state = LoadState::Empty;
               true
            }
            LoadState::Empty => true,
         });
         if begin {
            self.begin_load();
         }
      });
   }

   /// Whether a result (success or failure) is currently stored.
   ///
   /// Never triggers a load.
   #[inline]
   pub fn is_loaded(&self) -> bool {
      self
         .shared
         .core
         .mutate(|core| matches!(core.state, LoadState::Loaded(_)))
   }

   /// Returns the stored result, if any, without triggering a load.
   pub fn peek(&self) -> Option<Result<V, E>> {
      self.shared.core.mutate(|core| match core.state {
         LoadState::Loaded(ref result) => Some(result.clone()),
         _ => None,
      })
   }

   /// Shared load-initiation step behind `get`/`load`/`reload`.
   ///
   /// Call only while holding the state lock.
   fn begin_load(&self) {
      let begin = self.shared.core.mutate(|core| match core.state {
         LoadState::Loading | LoadState::Loaded(_) => false,
         LoadState::Empty => {
            core.state = LoadState::Loading;
            true
         }
      });
      if !begin {
         return;
      }
      debug_log!("dispatching loader");
      // Never run the loader inline on the caller's stack.
      let shared = Arc::clone(&self.shared);
      thread::spawn(move || {
         let completion_shared = Arc::clone(&shared);
         (shared.loader)(Box::new(move |result| completion_shared.complete(result)));
      });
   }
}

// --- Trait Implementations ---

impl<V, E> Clone for LazyAsyncCell<V, E> {
   /// Returns a new handle to the same slot.
   ///
   /// All handles observe the same state machine; cloning never duplicates
   /// the stored value or the loader.
   #[inline]
   fn clone(&self) -> Self {
      Self {
         shared: Arc::clone(&self.shared),
      }
   }
}

impl<V, E> fmt::Debug for LazyAsyncCell<V, E> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      let state = self.shared.core.mutate(|core| match core.state {
         LoadState::Empty => "empty",
         LoadState::Loading => "loading",
         LoadState::Loaded(Ok(_)) => "loaded",
         LoadState::Loaded(Err(_)) => "failed",
      });
      f.debug_struct("LazyAsyncCell").field("state", &state).finish()
   }
}
