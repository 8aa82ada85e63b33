//! Retry policy types and configuration.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use rand::{Rng, RngCore};

use super::callback::{NoopCallback, RetryCallback};
use super::cancel::Cancellation;
use crate::backoff::{self, Backoff};

/// Attempts allowed when none (or an invalid number) is configured.
pub const DEFAULT_ATTEMPTS: u64 = 3;

/// Attempt budgets must be strictly below this.
pub const MAX_ATTEMPTS: u64 = u16::MAX as u64;

/// Default multiplier applied to the attempt count when computing pressure.
pub const DEFAULT_FACTOR: f64 = 1.0;

/// Default upper bound of the random term added to pressure.
pub const DEFAULT_JITTER: f64 = 3.0;

/// Default wait before the first attempt, also added to every backoff.
pub const DEFAULT_INIT_DELAY: Duration = backoff::DEFAULT_DELAY;

type RetryIf<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// A retry policy describing how to retry a failed operation.
///
/// Policies are built with chained `with_*` calls and handed to
/// [`Retry::new`](crate::Retry::new), which normalizes them once. After that
/// the policy is never mutated, so one engine can serve any number of
/// concurrent runs.
///
/// # Delay computation
///
/// After the `n`th failed attempt the engine computes
///
/// ```text
/// pressure = trunc(random[0, 1) * jitter + n * factor)   (DEFAULT_DELAY_UNITS if <= 0)
/// wait     = backoff(pressure) + init_delay
/// ```
///
/// # Examples
///
/// ```rust
/// use rebound::{Backoff, RetryPolicy};
/// use std::time::Duration;
///
/// let policy = RetryPolicy::<String>::new()
///     .with_attempts(5)
///     .with_error_attempts("timeout".to_string(), 2)
///     .with_backoff(Backoff::Exponential)
///     .with_init_delay(Duration::from_millis(50))
///     .with_retry_if(|err: &String| err != "fatal")
///     .with_detail(true);
///
/// assert_eq!(policy.attempts(), 5);
/// assert!(policy.should_retry(&"timeout".to_string()));
/// assert!(!policy.should_retry(&"fatal".to_string()));
/// ```
pub struct RetryPolicy<E> {
    cancellation: Cancellation,
    callback: Arc<dyn RetryCallback<E>>,
    attempts: u64,
    attempts_by_error: HashMap<E, u64>,
    factor: f64,
    jitter: f64,
    init_delay: Duration,
    retry_if: Option<RetryIf<E>>,
    backoff: Backoff,
    detail: bool,
    seed: Option<u64>,
}

impl<E> RetryPolicy<E> {
    /// A policy with every knob at its default.
    ///
    /// Three attempts, exponential-plus-random backoff, 500ms initial delay,
    /// factor 1, jitter 3, retry on every error, no cancellation, no callback,
    /// no detail recording.
    pub fn new() -> Self {
        Self {
            cancellation: Cancellation::default(),
            callback: Arc::new(NoopCallback),
            attempts: DEFAULT_ATTEMPTS,
            attempts_by_error: HashMap::new(),
            factor: DEFAULT_FACTOR,
            jitter: DEFAULT_JITTER,
            init_delay: DEFAULT_INIT_DELAY,
            retry_if: None,
            backoff: Backoff::default(),
            detail: false,
            seed: None,
        }
    }

    /// A policy with a constant wait between attempts.
    ///
    /// Uses [`Backoff::Fixed`] with factor and jitter zeroed, so the pressure
    /// always falls back to its default and every wait is the same.
    ///
    /// ```rust
    /// use rebound::{backoff, RetryPolicy};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let policy = RetryPolicy::<()>::fixed();
    /// let mut rng = StdRng::seed_from_u64(0);
    /// let first = policy.next_delay(1, &mut rng);
    /// assert_eq!(first, policy.next_delay(7, &mut rng));
    /// assert_eq!(first, backoff::DEFAULT_DELAY * 2);
    /// ```
    pub fn fixed() -> Self {
        Self::new()
            .with_backoff(Backoff::Fixed)
            .with_factor(0.0)
            .with_jitter(0.0)
    }

    /// Set the token observed while waiting between attempts.
    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Set the hook called before each retry.
    pub fn with_callback<C>(mut self, callback: C) -> Self
    where
        C: RetryCallback<E> + 'static,
    {
        self.callback = Arc::new(callback);
        self
    }

    /// Set the total number of attempts, the first one included.
    ///
    /// Values outside `1..MAX_ATTEMPTS` are replaced with
    /// [`DEFAULT_ATTEMPTS`] on normalization.
    pub fn with_attempts(mut self, attempts: u64) -> Self {
        self.attempts = attempts;
        self
    }

    /// Set the backoff factor. Negative values fall back to the default.
    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    /// Set the initial delay. Zero falls back to the default.
    pub fn with_init_delay(mut self, delay: Duration) -> Self {
        self.init_delay = delay;
        self
    }

    /// Set the jitter magnitude. Negative values fall back to the default.
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Only retry errors for which `retry_if` returns true.
    pub fn with_retry_if<P>(mut self, retry_if: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.retry_if = Some(Arc::new(retry_if));
        self
    }

    /// Set the backoff strategy.
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Keep every failed attempt's error in the outcome.
    pub fn with_detail(mut self, detail: bool) -> Self {
        self.detail = detail;
        self
    }

    /// Seed the engine's random generator, making delays reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Replace invalid knobs with their defaults.
    ///
    /// [`Retry::new`](crate::Retry::new) calls this once; calling it again is
    /// a no-op.
    ///
    /// ```rust
    /// use rebound::retry::{DEFAULT_ATTEMPTS, DEFAULT_FACTOR, DEFAULT_INIT_DELAY};
    /// use rebound::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::<()>::new()
    ///     .with_attempts(0)
    ///     .with_factor(-2.0)
    ///     .with_init_delay(Duration::ZERO)
    ///     .normalize();
    ///
    /// assert_eq!(policy.attempts(), DEFAULT_ATTEMPTS);
    /// assert_eq!(policy.factor(), DEFAULT_FACTOR);
    /// assert_eq!(policy.init_delay(), DEFAULT_INIT_DELAY);
    /// ```
    pub fn normalize(mut self) -> Self {
        if self.attempts == 0 || self.attempts >= MAX_ATTEMPTS {
            self.attempts = DEFAULT_ATTEMPTS;
        }
        if self.factor.is_nan() || self.factor < 0.0 {
            self.factor = DEFAULT_FACTOR;
        }
        if self.init_delay.is_zero() {
            self.init_delay = DEFAULT_INIT_DELAY;
        }
        if self.jitter.is_nan() || self.jitter < 0.0 {
            self.jitter = DEFAULT_JITTER;
        }
        self
    }

    /// The cancellation token.
    pub fn cancellation(&self) -> &Cancellation {
        &self.cancellation
    }

    /// The retry callback.
    pub fn callback(&self) -> &dyn RetryCallback<E> {
        self.callback.as_ref()
    }

    /// The global attempt budget.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Per-error attempt budgets.
    pub fn attempts_by_error(&self) -> &HashMap<E, u64> {
        &self.attempts_by_error
    }

    /// The backoff factor.
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// The jitter magnitude.
    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    /// The initial delay.
    pub fn init_delay(&self) -> Duration {
        self.init_delay
    }

    /// The backoff strategy.
    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// Whether failed attempts' errors are recorded.
    pub fn detail(&self) -> bool {
        self.detail
    }

    /// The random seed, if one was set.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Evaluate the retry predicate.
    ///
    /// Without a predicate every error is retried.
    pub fn should_retry(&self, error: &E) -> bool {
        self.retry_if.as_ref().map_or(true, |retry_if| retry_if(error))
    }

    /// Pressure fed to the backoff strategy after `attempts` failures.
    pub fn pressure(&self, attempts: u64, rng: &mut dyn RngCore) -> i64 {
        let raw = rng.random::<f64>() * self.jitter + attempts as f64 * self.factor;
        // `as` saturates on overflow and maps NaN to zero
        let pressure = raw as i64;
        if pressure <= 0 {
            backoff::DEFAULT_DELAY_UNITS
        } else {
            pressure
        }
    }

    /// Wait before the next attempt after `attempts` failures.
    pub fn next_delay(&self, attempts: u64, rng: &mut dyn RngCore) -> Duration {
        let pressure = self.pressure(attempts, rng);
        self.backoff
            .delay(pressure, rng)
            .saturating_add(self.init_delay)
    }
}

impl<E: Eq + Hash> RetryPolicy<E> {
    /// Replace the per-error attempt budgets.
    ///
    /// An error listed here may cause at most `budget` retries; one more
    /// occurrence ends the run with
    /// [`RetryError::ErrorAttemptsExceeded`](crate::RetryError::ErrorAttemptsExceeded).
    /// Errors not listed are bounded only by the global budget.
    pub fn with_attempts_by_error<I>(mut self, budgets: I) -> Self
    where
        I: IntoIterator<Item = (E, u64)>,
    {
        self.attempts_by_error = budgets.into_iter().collect();
        self
    }

    /// Add or replace the attempt budget of a single error.
    pub fn with_error_attempts(mut self, error: E, budget: u64) -> Self {
        self.attempts_by_error.insert(error, budget);
        self
    }
}

impl<E> Default for RetryPolicy<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone> Clone for RetryPolicy<E> {
    fn clone(&self) -> Self {
        Self {
            cancellation: self.cancellation.clone(),
            callback: Arc::clone(&self.callback),
            attempts: self.attempts,
            attempts_by_error: self.attempts_by_error.clone(),
            factor: self.factor,
            jitter: self.jitter,
            init_delay: self.init_delay,
            retry_if: self.retry_if.clone(),
            backoff: self.backoff.clone(),
            detail: self.detail,
            seed: self.seed,
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for RetryPolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("cancellation", &self.cancellation)
            .field("attempts", &self.attempts)
            .field("attempts_by_error", &self.attempts_by_error)
            .field("factor", &self.factor)
            .field("jitter", &self.jitter)
            .field("init_delay", &self.init_delay)
            .field("backoff", &self.backoff)
            .field("detail", &self.detail)
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod policy_tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(9)
    }

    #[test]
    fn test_defaults() {
        let policy = RetryPolicy::<String>::new();
        assert_eq!(policy.attempts(), 3);
        assert!(policy.attempts_by_error().is_empty());
        assert_eq!(policy.factor(), 1.0);
        assert_eq!(policy.jitter(), 3.0);
        assert_eq!(policy.init_delay(), Duration::from_millis(500));
        assert!(matches!(policy.backoff(), Backoff::Combined(v) if v.len() == 2));
        assert!(!policy.detail());
        assert!(policy.should_retry(&"anything".to_string()));
        assert!(!policy.cancellation().is_cancelled());
        assert_eq!(policy.seed(), None);
    }

    #[test]
    fn test_fixed_preset() {
        let policy = RetryPolicy::<()>::fixed();
        assert!(matches!(policy.backoff(), Backoff::Fixed));
        assert_eq!(policy.factor(), 0.0);
        assert_eq!(policy.jitter(), 0.0);
    }

    #[test]
    fn test_normalize_attempt_bounds() {
        let p = RetryPolicy::<()>::new().with_attempts(0).normalize();
        assert_eq!(p.attempts(), DEFAULT_ATTEMPTS);

        let p = RetryPolicy::<()>::new().with_attempts(u64::MAX).normalize();
        assert_eq!(p.attempts(), DEFAULT_ATTEMPTS);

        let p = RetryPolicy::<()>::new().with_attempts(MAX_ATTEMPTS).normalize();
        assert_eq!(p.attempts(), DEFAULT_ATTEMPTS);

        let p = RetryPolicy::<()>::new()
            .with_attempts(MAX_ATTEMPTS - 1)
            .normalize();
        assert_eq!(p.attempts(), MAX_ATTEMPTS - 1);

        let p = RetryPolicy::<()>::new().with_attempts(1).normalize();
        assert_eq!(p.attempts(), 1);
    }

    #[test]
    fn test_normalize_numeric_knobs() {
        let p = RetryPolicy::<()>::new()
            .with_factor(-1.0)
            .with_jitter(f64::NAN)
            .with_init_delay(Duration::ZERO)
            .normalize();
        assert_eq!(p.factor(), DEFAULT_FACTOR);
        assert_eq!(p.jitter(), DEFAULT_JITTER);
        assert_eq!(p.init_delay(), DEFAULT_INIT_DELAY);
    }

    #[test]
    fn test_normalize_keeps_valid_zeroes() {
        let p = RetryPolicy::<()>::fixed().normalize();
        assert_eq!(p.factor(), 0.0);
        assert_eq!(p.jitter(), 0.0);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let p = RetryPolicy::<()>::new()
            .with_attempts(7)
            .with_jitter(-4.0)
            .normalize()
            .normalize();
        assert_eq!(p.attempts(), 7);
        assert_eq!(p.jitter(), DEFAULT_JITTER);
    }

    #[test]
    fn test_error_budgets() {
        let p = RetryPolicy::<&str>::new()
            .with_attempts_by_error([("a", 1), ("b", 2)])
            .with_error_attempts("b", 5);
        assert_eq!(p.attempts_by_error().get("a"), Some(&1));
        assert_eq!(p.attempts_by_error().get("b"), Some(&5));
    }

    #[test]
    fn test_pressure_without_jitter_or_factor_is_default() {
        let p = RetryPolicy::<()>::fixed();
        assert_eq!(p.pressure(3, &mut rng()), backoff::DEFAULT_DELAY_UNITS);
    }

    #[test]
    fn test_pressure_grows_with_attempts() {
        let p = RetryPolicy::<()>::new().with_jitter(0.0).with_factor(2.0);
        assert_eq!(p.pressure(1, &mut rng()), 2);
        assert_eq!(p.pressure(4, &mut rng()), 8);
    }

    #[test]
    fn test_pressure_jitter_bounds() {
        let p = RetryPolicy::<()>::new().with_jitter(3.0).with_factor(1.0);
        let mut rng = rng();
        for _ in 0..100 {
            let pressure = p.pressure(2, &mut rng);
            assert!((2..5).contains(&pressure));
        }
    }

    #[test]
    fn test_next_delay_adds_init_delay() {
        let p = RetryPolicy::<()>::new()
            .with_backoff(Backoff::Fixed)
            .with_jitter(0.0)
            .with_factor(1.0)
            .with_init_delay(Duration::from_millis(20));
        assert_eq!(p.next_delay(3, &mut rng()), Duration::from_millis(320));
    }

    #[test]
    fn test_seeded_delays_are_reproducible() {
        let p = RetryPolicy::<()>::new().with_seed(11);
        let mut a = StdRng::seed_from_u64(11);
        let mut b = StdRng::seed_from_u64(11);
        for n in 1..6 {
            assert_eq!(p.next_delay(n, &mut a), p.next_delay(n, &mut b));
        }
    }

    #[test]
    fn test_policy_is_clone_and_debug() {
        let p = RetryPolicy::<String>::new().with_error_attempts("x".into(), 1);
        let cloned = p.clone();
        assert_eq!(cloned.attempts_by_error(), p.attempts_by_error());
        let debug = format!("{:?}", cloned);
        assert!(debug.contains("RetryPolicy"));
        assert!(debug.contains("attempts_by_error"));
    }
}
