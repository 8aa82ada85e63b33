//! Hooks invoked before each retry.

use std::time::Duration;

/// Observer notified once per retry decision.
///
/// Called synchronously on the engine's task, after the next delay has been
/// computed and before the attempt budgets are checked. It is never called
/// for a successful attempt or for an attempt rejected by the retry
/// predicate.
///
/// Any `Fn(u64, Duration, &E)` closure is a callback:
///
/// ```rust
/// use rebound::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::<String>::new().with_callback(
///     |attempt: u64, delay: Duration, err: &String| {
///         eprintln!("attempt {attempt} failed ({err}), retrying in {delay:?}");
///     },
/// );
/// # let _ = policy;
/// ```
pub trait RetryCallback<E>: Send + Sync {
    /// `attempts` is the number of attempts made so far, `delay` the wait
    /// before the next one, `error` the failure that triggered the retry.
    fn on_retry(&self, attempts: u64, delay: Duration, error: &E);
}

impl<E, F> RetryCallback<E> for F
where
    F: Fn(u64, Duration, &E) + Send + Sync,
{
    fn on_retry(&self, attempts: u64, delay: Duration, error: &E) {
        self(attempts, delay, error)
    }
}

/// Callback that does nothing. The default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoopCallback;

impl<E> RetryCallback<E> for NoopCallback {
    fn on_retry(&self, _attempts: u64, _delay: Duration, _error: &E) {}
}

/// Callback that logs every retry at `WARN`.
#[cfg(feature = "tracing")]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TracingCallback;

#[cfg(feature = "tracing")]
impl<E: std::fmt::Debug> RetryCallback<E> for TracingCallback {
    fn on_retry(&self, attempts: u64, delay: Duration, error: &E) {
        tracing::warn!(attempt = attempts, ?delay, ?error, "attempt failed, retrying");
    }
}

#[cfg(test)]
mod callback_tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_closure_is_callback() {
        let seen = Arc::new(AtomicU64::new(0));
        let cb = {
            let seen = seen.clone();
            move |attempts: u64, _: Duration, _: &&str| {
                seen.store(attempts, Ordering::SeqCst);
            }
        };
        cb.on_retry(4, Duration::ZERO, &"boom");
        assert_eq!(seen.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_noop_callback() {
        RetryCallback::<i32>::on_retry(&NoopCallback, 1, Duration::from_secs(1), &7);
    }

    #[cfg(feature = "tracing")]
    #[tracing_test::traced_test]
    #[test]
    fn test_tracing_callback_logs() {
        TracingCallback.on_retry(2, Duration::from_millis(700), &"connection reset");
        assert!(logs_contain("attempt failed, retrying"));
        assert!(logs_contain("connection reset"));
    }
}
