//! Cancellation tokens observed between attempts.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a [`Cancellation`] fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelReason {
    /// [`Cancellation::cancel`] was called on the token or one of its clones.
    Cancelled,
    /// The token's deadline passed.
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Cancelled => write!(f, "operation cancelled"),
            CancelReason::DeadlineExceeded => write!(f, "deadline exceeded"),
        }
    }
}

impl std::error::Error for CancelReason {}

/// A cloneable cancel signal with an optional deadline.
///
/// The engine only looks at the token while waiting between attempts; a
/// running operation is never interrupted. Clones share the same underlying
/// signal, so cancelling any clone cancels them all.
///
/// The default token has no deadline and is never cancelled unless a clone
/// of it is.
///
/// # Examples
///
/// ```rust
/// use rebound::{CancelReason, Cancellation};
///
/// let cancel = Cancellation::new();
/// let handle = cancel.clone();
/// assert_eq!(cancel.reason(), None);
///
/// handle.cancel();
/// assert_eq!(cancel.reason(), Some(CancelReason::Cancelled));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// A fresh token with no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing tokio-util token, e.g. one shared with a server's
    /// shutdown path.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Fire with [`CancelReason::DeadlineExceeded`] at `deadline`.
    ///
    /// An earlier deadline already on the token is kept.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Fire with [`CancelReason::DeadlineExceeded`] once `timeout` has passed
    /// from now.
    ///
    /// A timeout too large to represent as an instant sets no deadline.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Cancel this token and every clone of it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The underlying tokio-util token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Returns the reason if the token has already fired.
    ///
    /// Explicit cancellation takes precedence over an expired deadline.
    pub fn reason(&self) -> Option<CancelReason> {
        if self.token.is_cancelled() {
            Some(CancelReason::Cancelled)
        } else if self.deadline.is_some_and(|d| Instant::now() >= d) {
            Some(CancelReason::DeadlineExceeded)
        } else {
            None
        }
    }

    /// Returns true if the token has already fired.
    pub fn is_cancelled(&self) -> bool {
        self.reason().is_some()
    }

    /// Resolves when the token fires, yielding the reason.
    ///
    /// Without a deadline and without anyone calling [`cancel`](Self::cancel)
    /// this never resolves.
    pub async fn cancelled(&self) -> CancelReason {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    _ = self.token.cancelled() => CancelReason::Cancelled,
                    _ = tokio::time::sleep_until(deadline) => CancelReason::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                CancelReason::Cancelled
            }
        }
    }
}

#[cfg(test)]
mod cancel_tests {
    use super::*;

    #[test]
    fn test_default_never_fired() {
        let cancel = Cancellation::default();
        assert!(!cancel.is_cancelled());
        assert_eq!(cancel.deadline(), None);
    }

    #[test]
    fn test_cancel_propagates_to_clones() {
        let cancel = Cancellation::new();
        let clone = cancel.clone();
        clone.cancel();
        assert_eq!(cancel.reason(), Some(CancelReason::Cancelled));
    }

    #[test]
    fn test_from_token_shares_signal() {
        let token = CancellationToken::new();
        let cancel = Cancellation::from_token(token.clone());
        token.cancel();
        assert!(cancel.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_fires() {
        let cancel = Cancellation::new().with_timeout(Duration::from_millis(50));
        assert_eq!(cancel.reason(), None);
        assert_eq!(cancel.cancelled().await, CancelReason::DeadlineExceeded);
        assert_eq!(cancel.reason(), Some(CancelReason::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_cancel_wins_over_deadline() {
        let cancel = Cancellation::new().with_timeout(Duration::from_millis(50));
        cancel.cancel();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(cancel.reason(), Some(CancelReason::Cancelled));
        assert_eq!(cancel.cancelled().await, CancelReason::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_earliest_deadline_kept() {
        let now = Instant::now();
        let cancel = Cancellation::new()
            .with_deadline(now + Duration::from_millis(10))
            .with_deadline(now + Duration::from_secs(10));
        assert_eq!(cancel.deadline(), Some(now + Duration::from_millis(10)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_timeout_sets_no_deadline() {
        let cancel = Cancellation::new().with_timeout(Duration::MAX);
        assert_eq!(cancel.deadline(), None);
        assert!(!cancel.is_cancelled());

        let now = Instant::now();
        let cancel = Cancellation::new()
            .with_deadline(now + Duration::from_millis(10))
            .with_timeout(Duration::MAX);
        assert_eq!(cancel.deadline(), Some(now + Duration::from_millis(10)));
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(CancelReason::Cancelled.to_string(), "operation cancelled");
        assert_eq!(CancelReason::DeadlineExceeded.to_string(), "deadline exceeded");
    }
}
