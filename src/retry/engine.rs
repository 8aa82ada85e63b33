//! The retry loop.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::time::Instant;

use super::error::RetryError;
use super::outcome::RetryOutcome;
use super::policy::RetryPolicy;

/// Runs operations under a normalized [`RetryPolicy`].
///
/// A run alternates between waiting and attempting. It starts by waiting
/// `init_delay`. A wait ends either when the delay elapses, leading to the
/// next attempt, or when the policy's [`Cancellation`](crate::Cancellation)
/// fires, ending the run. If both are ready at once, cancellation wins.
///
/// After a failed attempt the checks run in this order, and the first
/// one that stops the run decides the outcome's error:
///
/// 1. the retry predicate ([`RetryError::PredicateRejected`]),
/// 2. the error's own budget, after the callback has been told about the
///    retry ([`RetryError::ErrorAttemptsExceeded`]),
/// 3. the global budget ([`RetryError::AttemptsExceeded`]).
///
/// An engine can be shared (e.g. behind an `Arc`) by concurrent runs. Each
/// run gets its own timer, outcome and copy of the per-error budgets, so
/// runs never consume each other's budgets.
///
/// # Examples
///
/// ```rust
/// use rebound::{Backoff, Retry, RetryError, RetryPolicy};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let retry = Retry::new(
///     RetryPolicy::new()
///         .with_attempts(5)
///         .with_error_attempts("not found", 0)
///         .with_init_delay(Duration::from_millis(1))
///         .with_backoff(Backoff::custom(|_| Duration::from_millis(1))),
/// );
///
/// let outcome = retry.execute(|| Err::<(), _>("not found")).await;
/// assert_eq!(outcome.count(), 1);
/// assert_eq!(outcome.error(), Some(&RetryError::ErrorAttemptsExceeded));
///
/// let outcome = retry.execute(|| Ok::<_, &str>(42)).await;
/// assert_eq!(outcome.into_data(), Some(42));
/// # });
/// ```
pub struct Retry<E> {
    policy: RetryPolicy<E>,
    rng: Mutex<StdRng>,
}

impl<E> Retry<E> {
    /// Normalize `policy` and build an engine around it.
    pub fn new(policy: RetryPolicy<E>) -> Self {
        let policy = policy.normalize();
        let rng = match policy.seed() {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        Self {
            policy,
            rng: Mutex::new(rng),
        }
    }

    /// The normalized policy.
    pub fn policy(&self) -> &RetryPolicy<E> {
        &self.policy
    }

    fn next_delay(&self, attempts: u64) -> Duration {
        // a poisoned generator is still a valid generator
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        self.policy.next_delay(attempts, &mut *rng)
    }
}

impl<E: Eq + Hash> Retry<E> {
    /// Retry a synchronous operation.
    ///
    /// The operation runs inline on the calling task and is never
    /// interrupted; cancellation is only observed between attempts.
    pub async fn execute<T, F>(&self, mut operation: F) -> RetryOutcome<T, E>
    where
        F: FnMut() -> Result<T, E>,
    {
        self.execute_async(move || std::future::ready(operation()))
            .await
    }

    /// Retry an asynchronous operation.
    ///
    /// Each attempt's future is awaited to completion; it is not raced
    /// against cancellation.
    pub async fn execute_async<T, F, Fut>(&self, mut operation: F) -> RetryOutcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let start = Instant::now();
        let cancellation = self.policy.cancellation();
        let mut budgets: HashMap<&E, u64> = self
            .policy
            .attempts_by_error()
            .iter()
            .map(|(error, budget)| (error, *budget))
            .collect();
        let mut attempt_errors = Vec::new();
        let mut count = 0u64;

        let mut timer = std::pin::pin!(tokio::time::sleep(self.policy.init_delay()));

        loop {
            tokio::select! {
                biased;
                reason = cancellation.cancelled() => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(attempt = count, %reason, "retry cancelled while waiting");
                    return RetryOutcome::failure(
                        count,
                        RetryError::Cancelled(reason),
                        attempt_errors,
                        start.elapsed(),
                    );
                }
                _ = timer.as_mut() => {}
            }

            let result = operation().await;
            count += 1;

            let error = match result {
                Ok(data) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(attempt = count, "attempt succeeded");
                    return RetryOutcome::success(count, data, attempt_errors, start.elapsed());
                }
                Err(error) => error,
            };

            #[cfg(feature = "tracing")]
            tracing::debug!(attempt = count, "attempt failed");

            let decision = self.decide(count, &error, &mut budgets);
            if self.policy.detail() {
                attempt_errors.push(error);
            }

            match decision {
                Ok(wait) => {
                    #[cfg(feature = "tracing")]
                    tracing::trace!(attempt = count, delay = ?wait, "next attempt scheduled");
                    match Instant::now().checked_add(wait) {
                        Some(deadline) => timer.as_mut().reset(deadline),
                        // `sleep` clamps unrepresentable deadlines to the far future
                        None => timer.set(tokio::time::sleep(wait)),
                    }
                }
                Err(stop) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(attempt = count, reason = %stop, "retry stopped");
                    return RetryOutcome::failure(count, stop, attempt_errors, start.elapsed());
                }
            }
        }
    }

    /// Decide what follows the `count`th failed attempt: the wait before the
    /// next one, or the reason to stop.
    fn decide(
        &self,
        count: u64,
        error: &E,
        budgets: &mut HashMap<&E, u64>,
    ) -> Result<Duration, RetryError> {
        if !self.policy.should_retry(error) {
            return Err(RetryError::PredicateRejected);
        }

        let wait = self.next_delay(count);
        self.policy.callback().on_retry(count, wait, error);

        if let Some(remaining) = budgets.get_mut(error) {
            if *remaining == 0 {
                return Err(RetryError::ErrorAttemptsExceeded);
            }
            *remaining -= 1;
        }

        if count >= self.policy.attempts() {
            return Err(RetryError::AttemptsExceeded);
        }

        Ok(wait)
    }
}

impl<E> Default for Retry<E> {
    fn default() -> Self {
        Self::new(RetryPolicy::new())
    }
}

impl<E: fmt::Debug> fmt::Debug for Retry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retry")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Build an engine for `policy` and retry `operation` once with it.
///
/// Prefer keeping a [`Retry`] around when the same policy is used
/// repeatedly; this normalizes the policy on every call.
pub async fn execute<T, E, F>(operation: F, policy: RetryPolicy<E>) -> RetryOutcome<T, E>
where
    E: Eq + Hash,
    F: FnMut() -> Result<T, E>,
{
    Retry::new(policy).execute(operation).await
}

/// Retry `operation` under the default policy.
///
/// ```rust
/// use rebound::execute_with_default;
///
/// # tokio_test::block_on(async {
/// let outcome = execute_with_default(|| Ok::<_, String>("lee")).await;
/// assert!(outcome.is_success());
/// assert_eq!(outcome.count(), 1);
/// assert_eq!(outcome.data(), Some(&"lee"));
/// # });
/// ```
pub async fn execute_with_default<T, E, F>(operation: F) -> RetryOutcome<T, E>
where
    E: Eq + Hash,
    F: FnMut() -> Result<T, E>,
{
    Retry::default().execute(operation).await
}
