//! Backoff strategies mapping a "pressure" value to a delay.
//!
//! Every strategy is total: a non-positive input, or a result that would be
//! meaningless, yields [`DEFAULT_DELAY`] instead. All arithmetic saturates, so
//! huge inputs produce huge (but valid) durations rather than overflowing.
//!
//! # Examples
//!
//! ```rust
//! use rebound::backoff::{self, Backoff, BASE_INTERVAL, DEFAULT_DELAY};
//! use rand::{rngs::StdRng, SeedableRng};
//! use std::time::Duration;
//!
//! assert_eq!(backoff::fixed(3), BASE_INTERVAL * 3);
//! assert_eq!(backoff::exponential(3), BASE_INTERVAL * 8);
//! assert_eq!(backoff::fixed(0), DEFAULT_DELAY);
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let combined = Backoff::combine([Backoff::Fixed, Backoff::Exponential]);
//! assert_eq!(combined.delay(2, &mut rng), Duration::from_millis(600));
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::{Rng, RngCore};

/// Unit every strategy scales by, in milliseconds.
pub const BASE_INTERVAL_MS: u64 = 100;

/// Unit every strategy scales by.
pub const BASE_INTERVAL: Duration = Duration::from_millis(BASE_INTERVAL_MS);

/// Number of base units in [`DEFAULT_DELAY`].
pub const DEFAULT_DELAY_UNITS: i64 = 5;

/// Delay substituted whenever a strategy has no meaningful answer.
pub const DEFAULT_DELAY: Duration =
    Duration::from_millis(BASE_INTERVAL_MS * DEFAULT_DELAY_UNITS as u64);

/// Largest exponent [`exponential`] will raise 2 to.
pub const MAX_EXPONENT: i64 = 62;

/// `units * BASE_INTERVAL`, saturating at `u64::MAX` milliseconds.
fn scale(units: u64) -> Duration {
    Duration::from_millis(BASE_INTERVAL_MS.saturating_mul(units))
}

/// Fixed backoff: `n * BASE_INTERVAL`.
pub fn fixed(n: i64) -> Duration {
    if n <= 0 {
        return DEFAULT_DELAY;
    }
    scale(n as u64)
}

/// Random backoff: uniform in `[0, n) * BASE_INTERVAL`.
///
/// The caller owns the random source; the engine passes its own generator
/// while holding the lock that serializes access to it.
pub fn random(n: i64, rng: &mut dyn RngCore) -> Duration {
    if n <= 0 {
        return DEFAULT_DELAY;
    }
    scale(rng.random_range(0..n as u64))
}

/// Exponential backoff: `2^n * BASE_INTERVAL`, with `n` clamped to [`MAX_EXPONENT`].
pub fn exponential(n: i64) -> Duration {
    if n <= 0 {
        return DEFAULT_DELAY;
    }
    scale(1u64 << n.min(MAX_EXPONENT))
}

/// A backoff strategy.
///
/// Strategies are data: they can be cloned, combined and inspected. The
/// engine evaluates them with [`Backoff::delay`], passing the pressure value
/// computed from the attempt count, factor and jitter.
#[derive(Clone)]
pub enum Backoff {
    /// See [`fixed`].
    Fixed,
    /// See [`random`].
    Random,
    /// See [`exponential`].
    Exponential,
    /// Sum of every inner strategy for the same input.
    Combined(Vec<Backoff>),
    /// Caller-supplied delay function.
    Custom(Arc<dyn Fn(i64) -> Duration + Send + Sync>),
}

impl Backoff {
    /// Combine strategies into one that sums their delays.
    ///
    /// Combining nothing degenerates to [`Backoff::Fixed`].
    pub fn combine<I>(strategies: I) -> Self
    where
        I: IntoIterator<Item = Backoff>,
    {
        let strategies: Vec<_> = strategies.into_iter().collect();
        if strategies.is_empty() {
            Backoff::Fixed
        } else {
            Backoff::Combined(strategies)
        }
    }

    /// Wrap a closure as a strategy.
    ///
    /// ```rust
    /// use rebound::backoff::Backoff;
    /// use rand::{rngs::StdRng, SeedableRng};
    /// use std::time::Duration;
    ///
    /// let linear = Backoff::custom(|n| Duration::from_millis(10 * n as u64));
    /// let mut rng = StdRng::seed_from_u64(1);
    /// assert_eq!(linear.delay(4, &mut rng), Duration::from_millis(40));
    /// ```
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(i64) -> Duration + Send + Sync + 'static,
    {
        Backoff::Custom(Arc::new(f))
    }

    /// Compute the delay for pressure `n`.
    pub fn delay(&self, n: i64, rng: &mut dyn RngCore) -> Duration {
        match self {
            Backoff::Fixed => fixed(n),
            Backoff::Random => random(n, rng),
            Backoff::Exponential => exponential(n),
            Backoff::Combined(strategies) => {
                let total = strategies
                    .iter()
                    .fold(Duration::ZERO, |acc, s| acc.saturating_add(s.delay(n, rng)));
                if total.is_zero() {
                    DEFAULT_DELAY
                } else {
                    total
                }
            }
            Backoff::Custom(f) => f(n),
        }
    }
}

impl Default for Backoff {
    /// Exponential growth plus a random spread.
    fn default() -> Self {
        Backoff::Combined(vec![Backoff::Exponential, Backoff::Random])
    }
}

impl fmt::Debug for Backoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backoff::Fixed => f.write_str("Fixed"),
            Backoff::Random => f.write_str("Random"),
            Backoff::Exponential => f.write_str("Exponential"),
            Backoff::Combined(strategies) => f.debug_tuple("Combined").field(strategies).finish(),
            Backoff::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
