//! Retrying fallible operations.
//!
//! This module holds the pieces of a retry run:
//!
//! - **[`RetryPolicy`]**: plain configuration built with `with_*` calls
//! - **[`Retry`]**: the engine that normalizes a policy once and runs operations under it
//! - **[`RetryOutcome`]**: what a run produced (attempt count, data, terminal error, recorded errors)
//! - **[`Cancellation`]**: a cancel/deadline token observed between attempts
//! - **[`RetryCallback`]**: a hook told about every retry
//!
//! # Quick Start
//!
//! ```rust
//! use rebound::{Backoff, Retry, RetryPolicy};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let retry = Retry::new(
//!     RetryPolicy::new()
//!         .with_attempts(4)
//!         .with_init_delay(Duration::from_millis(1))
//!         .with_backoff(Backoff::custom(|n| Duration::from_millis(n as u64))),
//! );
//!
//! let mut failures_left = 2;
//! let outcome = retry
//!     .execute(|| {
//!         if failures_left > 0 {
//!             failures_left -= 1;
//!             Err("busy")
//!         } else {
//!             Ok(42)
//!         }
//!     })
//!     .await;
//!
//! assert!(outcome.is_success());
//! assert_eq!(outcome.count(), 3);
//! # });
//! ```
//!
//! # Stopping Conditions
//!
//! A run stops at the first of:
//!
//! - a successful attempt
//! - the cancellation token firing while waiting ([`RetryError::Cancelled`])
//! - the retry predicate rejecting an error ([`RetryError::PredicateRejected`])
//! - an error's own budget running out ([`RetryError::ErrorAttemptsExceeded`])
//! - the global budget running out ([`RetryError::AttemptsExceeded`])

mod callback;
mod cancel;
mod engine;
mod error;
mod outcome;
mod policy;
#[cfg(feature = "serde")]
mod settings;

#[cfg(feature = "tracing")]
pub use callback::TracingCallback;
pub use callback::{NoopCallback, RetryCallback};
pub use cancel::{CancelReason, Cancellation};
pub use engine::{execute, execute_with_default, Retry};
pub use error::{LookupError, RetryError};
pub use outcome::RetryOutcome;
pub use policy::{
    RetryPolicy, DEFAULT_ATTEMPTS, DEFAULT_FACTOR, DEFAULT_INIT_DELAY, DEFAULT_JITTER,
    MAX_ATTEMPTS,
};
#[cfg(feature = "serde")]
pub use settings::{BackoffKind, RetrySettings};
