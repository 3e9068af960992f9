//! Ready-made interceptors.
//!
//! The core chain has no retry or logging of its own; both are opt-in here behind the
//! `retry` and `tracing` features.

#[cfg(feature = "tracing")]
mod logging;
#[cfg(feature = "retry")]
mod retry;

#[cfg(feature = "tracing")]
pub use logging::Logging;
#[cfg(feature = "retry")]
pub use retry::Retry;
