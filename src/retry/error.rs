//! Error types for retry operations.

use std::fmt;

use super::cancel::CancelReason;

/// Why a retry run stopped without success.
///
/// The per-attempt errors produced by the operation are never returned
/// through this type; they are kept in
/// [`RetryOutcome::attempt_errors`](crate::RetryOutcome::attempt_errors)
/// when detail recording is on.
///
/// # Examples
///
/// ```rust
/// use rebound::{RetryError, RetryPolicy, Retry};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let retry = Retry::new(
///     RetryPolicy::new()
///         .with_attempts(2)
///         .with_init_delay(Duration::from_millis(1))
///         .with_backoff(rebound::Backoff::custom(|_| Duration::from_millis(1))),
/// );
///
/// let outcome = retry.execute(|| Err::<(), _>("always fails")).await;
/// assert_eq!(outcome.error(), Some(&RetryError::AttemptsExceeded));
/// assert_eq!(outcome.count(), 2);
/// # });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetryError {
    /// The cancellation token fired while waiting for the next attempt.
    Cancelled(CancelReason),
    /// The retry predicate returned false for the last error.
    PredicateRejected,
    /// The global attempt budget was used up.
    AttemptsExceeded,
    /// The last error's own attempt budget was used up.
    ErrorAttemptsExceeded,
}

impl RetryError {
    /// Returns true if the run stopped because its token fired.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// The cancellation reason, if the run was cancelled.
    pub fn cancel_reason(&self) -> Option<CancelReason> {
        match self {
            Self::Cancelled(reason) => Some(*reason),
            _ => None,
        }
    }
}

impl From<CancelReason> for RetryError {
    fn from(reason: CancelReason) -> Self {
        Self::Cancelled(reason)
    }
}

impl fmt::Display for RetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled(reason) => write!(f, "{}", reason),
            Self::PredicateRejected => write!(f, "retry predicate rejected the error"),
            Self::AttemptsExceeded => write!(f, "retry attempts exceeded"),
            Self::ErrorAttemptsExceeded => write!(f, "retry attempts for this error exceeded"),
        }
    }
}

impl std::error::Error for RetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Cancelled(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Error returned when looking up a recorded attempt error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupError {
    /// No attempt errors were recorded.
    NotFound,
    /// The requested index is past the end of the recorded errors.
    IndexOutOfBounds {
        /// The index that was asked for.
        index: usize,
        /// How many errors were recorded.
        len: usize,
    },
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "attempt error not found"),
            Self::IndexOutOfBounds { index, len } => write!(
                f,
                "attempt error index {} out of bounds ({} recorded)",
                index, len
            ),
        }
    }
}

impl std::error::Error for LookupError {}

#[cfg(test)]
mod error_tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_retry_error_display() {
        assert_eq!(
            RetryError::AttemptsExceeded.to_string(),
            "retry attempts exceeded"
        );
        assert!(RetryError::PredicateRejected.to_string().contains("predicate"));
        assert!(RetryError::ErrorAttemptsExceeded
            .to_string()
            .contains("for this error"));
    }

    #[test]
    fn test_cancelled_surfaces_reason_verbatim() {
        let err = RetryError::from(CancelReason::DeadlineExceeded);
        assert_eq!(err.to_string(), CancelReason::DeadlineExceeded.to_string());
        assert!(err.is_cancelled());
        assert_eq!(err.cancel_reason(), Some(CancelReason::DeadlineExceeded));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_non_cancel_has_no_source() {
        assert!(RetryError::AttemptsExceeded.source().is_none());
        assert!(!RetryError::AttemptsExceeded.is_cancelled());
        assert_eq!(RetryError::PredicateRejected.cancel_reason(), None);
    }

    #[test]
    fn test_lookup_error_display() {
        assert_eq!(LookupError::NotFound.to_string(), "attempt error not found");
        let err = LookupError::IndexOutOfBounds { index: 4, len: 2 };
        assert!(err.to_string().contains("index 4"));
        assert!(err.to_string().contains("2 recorded"));
    }
}
