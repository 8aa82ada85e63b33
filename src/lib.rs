//! # Rebound
//!
//! > *"Fall down seven times, stand up eight"*
//!
//! A Rust library for retrying fallible operations.
//!
//! ## Philosophy
//!
//! **Rebound** keeps the retry decision apart from the waiting:
//! - **Policy** = plain data (budgets, backoff, predicate), validated once
//! - **Engine** = a small state machine that waits, attempts and decides
//!
//! Every run ends in a [`RetryOutcome`]; per-attempt failures never escape
//! as panics or early returns.
//!
//! ## Quick Example
//!
//! ```rust
//! use rebound::{Backoff, Cancellation, Retry, RetryError, RetryPolicy};
//! use std::time::Duration;
//!
//! #[derive(Debug, Clone, PartialEq, Eq, Hash)]
//! enum FetchError {
//!     Timeout,
//!     NotFound,
//! }
//!
//! # tokio_test::block_on(async {
//! let cancel = Cancellation::new();
//! let retry = Retry::new(
//!     RetryPolicy::new()
//!         .with_attempts(5)
//!         .with_retry_if(|err: &FetchError| *err != FetchError::NotFound)
//!         .with_init_delay(Duration::from_millis(1))
//!         .with_backoff(Backoff::custom(|_| Duration::from_millis(1)))
//!         .with_cancellation(cancel.clone())
//!         .with_detail(true),
//! );
//!
//! let outcome = retry.execute(|| Err::<(), _>(FetchError::Timeout)).await;
//! assert_eq!(outcome.count(), 5);
//! assert_eq!(outcome.error(), Some(&RetryError::AttemptsExceeded));
//! assert_eq!(outcome.attempt_errors().len(), 5);
//!
//! let outcome = retry.execute(|| Err::<(), _>(FetchError::NotFound)).await;
//! assert_eq!(outcome.count(), 1);
//! assert_eq!(outcome.error(), Some(&RetryError::PredicateRejected));
//! # });
//! ```
//!
//! ## Features
//!
//! - `tracing` (default): engine events and [`TracingCallback`]
//! - `serde`: `RetrySettings` for loading policies from config files

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod backoff;
pub mod retry;

// Re-exports
pub use backoff::Backoff;
#[cfg(feature = "tracing")]
pub use retry::TracingCallback;
#[cfg(feature = "serde")]
pub use retry::{BackoffKind, RetrySettings};
pub use retry::{
    execute, execute_with_default, CancelReason, Cancellation, LookupError, NoopCallback, Retry,
    RetryCallback, RetryError, RetryOutcome, RetryPolicy,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::backoff::Backoff;
    pub use crate::retry::{
        execute, execute_with_default, CancelReason, Cancellation, Retry, RetryCallback,
        RetryError, RetryOutcome, RetryPolicy,
    };
}
