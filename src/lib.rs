//! A thread-safe, lazily-loaded single-value cache.
//!
//! This crate provides two building blocks:
//!
//! - [`LazyAsyncCell<V, E>`]: a single slot that stays empty until its value is
//!   requested, runs a user-supplied loader at most once per loading episode, and
//!   fans the produced value (or error) out to every caller that subscribed while
//!   the load was in flight. The slot can be cleared with
//!   [`reset`](LazyAsyncCell::reset) or refreshed with
//!   [`reload`](LazyAsyncCell::reload).
//! - [`GuardedState<T>`]: a reentrant-safe mutual-exclusion wrapper around an
//!   arbitrary value, used internally by the cell and reusable as a
//!   general-purpose primitive.
//!
//! # Guarantees
//!
//! - **Coalescing**: any number of concurrent [`get`](LazyAsyncCell::get) calls
//!   issued before a load completes share a single loader invocation and all
//!   receive the same result, in registration order.
//! - **Memoization**: once loaded, the stored result (success *or* failure) is
//!   served without touching the loader again until an explicit
//!   [`reset`](LazyAsyncCell::reset) or [`reload`](LazyAsyncCell::reload).
//! - **Deadlock freedom**: the loader is always dispatched on its own thread,
//!   never inline on the caller's stack, so even a loader that completes
//!   synchronously cannot re-enter the cell's exclusion region mid-transition.
//!   Consumer callbacks may call back into the cell from the thread that
//!   delivers their result.
//!
//! # Features
//!
//! - `async-tokio` *(default)*: enables [`get_async`](LazyAsyncCell::get_async)
//!   and the [`from_future`](LazyAsyncCell::from_future) constructor, bridging
//!   the callback surface to Tokio tasks.
//! - `tracing` *(default)*: emits `tracing` debug events on state transitions.
//!
//! # Examples
//!
//! ## Callback-style loading
//!
//! ```rust
//! use lazy_async_cell::LazyAsyncCell;
//!
//! let cell: LazyAsyncCell<String, String> = LazyAsyncCell::new(|complete| {
//!    std::thread::spawn(move || {
//!       // Stand-in for a network fetch or an expensive computation.
//!       complete(Ok("expensive value".to_string()));
//!    });
//! });
//!
//! // Every caller sees the same result; the loader ran once.
//! assert_eq!(cell.get_blocking(), Ok("expensive value".to_string()));
//! assert_eq!(cell.get_blocking(), Ok("expensive value".to_string()));
//! ```
//!
//! ## Async loading
//!
//! ```rust
//! # #[cfg(feature = "async-tokio")]
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! use lazy_async_cell::LazyAsyncCell;
//!
//! let cell = LazyAsyncCell::from_future(|| async { Ok::<_, String>(42u32) });
//! assert_eq!(cell.get_async().await, Ok(42));
//! # }
//! # #[cfg(not(feature = "async-tokio"))]
//! # fn main() {}
//! ```
//!
//! ## Guarded state
//!
//! ```rust
//! use lazy_async_cell::GuardedState;
//!
//! let counter = GuardedState::new(0u32);
//! counter.mutate(|n| *n += 1);
//! assert_eq!(counter.read(), 1);
//! ```

/// Lazily-loaded, request-coalescing single-value cache.
mod cell;

/// Reentrant-safe mutual exclusion around an arbitrary value.
mod guarded;

/// Crate-internal logging shims.
mod log;

pub use cell::{Completion, LazyAsyncCell};
pub use guarded::GuardedState;
