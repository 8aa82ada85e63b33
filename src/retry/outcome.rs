//! The result of one retry run.

use std::time::Duration;

use super::error::{LookupError, RetryError};

/// Everything a retry run produced.
///
/// Built by the engine and handed to the caller; there is no way to modify
/// it afterwards.
///
/// The attempt-error lookups read [`attempt_errors`](Self::attempt_errors)
/// only. That list is filled only when the policy had
/// [`with_detail(true)`](crate::RetryPolicy::with_detail), so an empty list
/// does not by itself mean no attempt failed.
///
/// # Examples
///
/// ```rust
/// use rebound::{execute, Backoff, LookupError, RetryPolicy};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let mut calls = 0;
/// let policy = RetryPolicy::new()
///     .with_detail(true)
///     .with_init_delay(Duration::from_millis(1))
///     .with_backoff(Backoff::custom(|_| Duration::from_millis(1)));
///
/// let outcome = execute(
///     || {
///         calls += 1;
///         if calls < 3 { Err(calls) } else { Ok("done") }
///     },
///     policy,
/// )
/// .await;
///
/// assert!(outcome.is_success());
/// assert_eq!(outcome.count(), 3);
/// assert_eq!(outcome.data(), Some(&"done"));
/// assert_eq!(outcome.attempt_errors(), &[1, 2]);
/// assert_eq!(outcome.first_attempt_error(), Ok(&1));
/// assert_eq!(outcome.last_attempt_error(), Ok(&2));
/// assert_eq!(
///     outcome.attempt_error(5),
///     Err(LookupError::IndexOutOfBounds { index: 5, len: 2 })
/// );
/// # });
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryOutcome<T, E> {
    count: u64,
    result: Result<T, RetryError>,
    attempt_errors: Vec<E>,
    elapsed: Duration,
}

impl<T, E> RetryOutcome<T, E> {
    pub(crate) fn success(
        count: u64,
        data: T,
        attempt_errors: Vec<E>,
        elapsed: Duration,
    ) -> Self {
        Self {
            count,
            result: Ok(data),
            attempt_errors,
            elapsed,
        }
    }

    pub(crate) fn failure(
        count: u64,
        error: RetryError,
        attempt_errors: Vec<E>,
        elapsed: Duration,
    ) -> Self {
        Self {
            count,
            result: Err(error),
            attempt_errors,
            elapsed,
        }
    }

    /// How many times the operation was invoked.
    ///
    /// Zero only when the run was cancelled before the first attempt.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Returns true if the last attempt succeeded.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// The success payload.
    pub fn data(&self) -> Option<&T> {
        self.result.as_ref().ok()
    }

    /// Take the success payload.
    pub fn into_data(self) -> Option<T> {
        self.result.ok()
    }

    /// Why the run stopped, or `None` on success.
    pub fn error(&self) -> Option<&RetryError> {
        self.result.as_ref().err()
    }

    /// Every recorded attempt error, oldest first.
    pub fn attempt_errors(&self) -> &[E] {
        &self.attempt_errors
    }

    /// Take the recorded attempt errors.
    pub fn into_attempt_errors(self) -> Vec<E> {
        self.attempt_errors
    }

    /// The most recent recorded attempt error.
    pub fn last_attempt_error(&self) -> Result<&E, LookupError> {
        self.attempt_errors.last().ok_or(LookupError::NotFound)
    }

    /// The earliest recorded attempt error.
    pub fn first_attempt_error(&self) -> Result<&E, LookupError> {
        self.attempt_errors.first().ok_or(LookupError::NotFound)
    }

    /// The recorded attempt error at `index`.
    pub fn attempt_error(&self, index: usize) -> Result<&E, LookupError> {
        self.attempt_errors
            .get(index)
            .ok_or(LookupError::IndexOutOfBounds {
                index,
                len: self.attempt_errors.len(),
            })
    }

    /// Wall time from the start of the run to its end.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Convert into a plain `Result`, dropping the attempt bookkeeping.
    pub fn into_result(self) -> Result<T, RetryError> {
        self.result
    }
}

#[cfg(test)]
mod outcome_tests {
    use super::*;
    use crate::retry::CancelReason;

    #[test]
    fn test_success_accessors() {
        let outcome: RetryOutcome<&str, &str> =
            RetryOutcome::success(2, "lee", vec!["boom"], Duration::from_millis(3));
        assert!(outcome.is_success());
        assert_eq!(outcome.count(), 2);
        assert_eq!(outcome.data(), Some(&"lee"));
        assert_eq!(outcome.error(), None);
        assert_eq!(outcome.last_attempt_error(), Ok(&"boom"));
        assert_eq!(outcome.first_attempt_error(), Ok(&"boom"));
        assert_eq!(outcome.elapsed(), Duration::from_millis(3));
        assert_eq!(outcome.into_result(), Ok("lee"));
    }

    #[test]
    fn test_empty_errors_yield_sentinels() {
        let outcome: RetryOutcome<(), String> = RetryOutcome::failure(
            0,
            RetryError::Cancelled(CancelReason::Cancelled),
            Vec::new(),
            Duration::ZERO,
        );
        assert!(!outcome.is_success());
        assert_eq!(outcome.data(), None);
        assert_eq!(outcome.last_attempt_error(), Err(LookupError::NotFound));
        assert_eq!(outcome.first_attempt_error(), Err(LookupError::NotFound));
        assert_eq!(
            outcome.attempt_error(0),
            Err(LookupError::IndexOutOfBounds { index: 0, len: 0 })
        );
        assert_eq!(
            outcome.into_result(),
            Err(RetryError::Cancelled(CancelReason::Cancelled))
        );
    }

    #[test]
    fn test_indexed_lookup() {
        let outcome: RetryOutcome<(), i32> = RetryOutcome::failure(
            3,
            RetryError::AttemptsExceeded,
            vec![1, 2, 3],
            Duration::ZERO,
        );
        assert_eq!(outcome.attempt_error(0), Ok(&1));
        assert_eq!(outcome.attempt_error(2), Ok(&3));
        assert_eq!(
            outcome.attempt_error(3),
            Err(LookupError::IndexOutOfBounds { index: 3, len: 3 })
        );
        assert_eq!(outcome.into_attempt_errors(), vec![1, 2, 3]);
    }
}
