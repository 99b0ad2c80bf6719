//! Crate-internal logging shims over the optional `tracing` dependency.

/// Emits a `tracing::debug!` event when the `tracing` feature is enabled and
/// compiles to nothing otherwise.
macro_rules! debug_log {
   ($($arg:tt)*) => {
      #[cfg(feature = "tracing")]
      tracing::debug!($($arg)*);
   };
}

pub(crate) use debug_log;
