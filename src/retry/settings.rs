//! Serializable retry settings (feature-gated).
//!
//! [`RetrySettings`] mirrors the plain-data knobs of a [`RetryPolicy`] so
//! they can live in a config file. Closures (predicate, callback, custom
//! backoff) and the cancellation token are attached to the resulting policy
//! in code.
//!
//! # Example
//!
//! ```rust,ignore
//! use rebound::{Retry, RetrySettings};
//!
//! let settings: RetrySettings = serde_json::from_str(
//!     r#"{ "attempts": 5, "backoff": "fixed", "init_delay_ms": 200 }"#,
//! )?;
//!
//! let retry: Retry<std::io::ErrorKind> = Retry::new(
//!     settings
//!         .into_policy()
//!         .with_retry_if(|kind| *kind != std::io::ErrorKind::PermissionDenied),
//! );
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::policy::{
    RetryPolicy, DEFAULT_ATTEMPTS, DEFAULT_FACTOR, DEFAULT_INIT_DELAY, DEFAULT_JITTER,
};
use crate::backoff::Backoff;

/// Named backoff strategies usable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffKind {
    /// [`Backoff::Fixed`].
    Fixed,
    /// [`Backoff::Random`].
    Random,
    /// [`Backoff::Exponential`].
    Exponential,
    /// Exponential plus random, the default.
    #[default]
    ExponentialRandom,
}

impl From<BackoffKind> for Backoff {
    fn from(kind: BackoffKind) -> Self {
        match kind {
            BackoffKind::Fixed => Backoff::Fixed,
            BackoffKind::Random => Backoff::Random,
            BackoffKind::Exponential => Backoff::Exponential,
            BackoffKind::ExponentialRandom => Backoff::default(),
        }
    }
}

/// Plain-data retry configuration.
///
/// Every field is optional when deserializing; missing fields take the same
/// defaults as [`RetryPolicy::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts, the first one included.
    pub attempts: u64,
    /// Multiplier applied to the attempt count when computing pressure.
    pub factor: f64,
    /// Upper bound of the random term added to pressure.
    pub jitter: f64,
    /// Wait before the first attempt, in milliseconds.
    pub init_delay_ms: u64,
    /// Record every failed attempt's error.
    pub detail: bool,
    /// Seed for the engine's random generator.
    pub seed: Option<u64>,
    /// Backoff strategy.
    pub backoff: BackoffKind,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            factor: DEFAULT_FACTOR,
            jitter: DEFAULT_JITTER,
            init_delay_ms: DEFAULT_INIT_DELAY.as_millis() as u64,
            detail: false,
            seed: None,
            backoff: BackoffKind::default(),
        }
    }
}

impl RetrySettings {
    /// Build a policy carrying these settings.
    ///
    /// Values are passed through as-is; [`Retry::new`](crate::Retry::new)
    /// normalizes them.
    pub fn into_policy<E>(self) -> RetryPolicy<E> {
        let policy = RetryPolicy::new()
            .with_attempts(self.attempts)
            .with_factor(self.factor)
            .with_jitter(self.jitter)
            .with_init_delay(Duration::from_millis(self.init_delay_ms))
            .with_detail(self.detail)
            .with_backoff(self.backoff.into());
        match self.seed {
            Some(seed) => policy.with_seed(seed),
            None => policy,
        }
    }
}

#[cfg(test)]
mod settings_tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default_policy() {
        let settings: RetrySettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, RetrySettings::default());

        let policy = settings.into_policy::<()>();
        assert_eq!(policy.attempts(), DEFAULT_ATTEMPTS);
        assert_eq!(policy.init_delay(), DEFAULT_INIT_DELAY);
        assert!(matches!(policy.backoff(), Backoff::Combined(_)));
    }

    #[test]
    fn test_fields_flow_into_policy() {
        let settings: RetrySettings = serde_json::from_str(
            r#"{
                "attempts": 7,
                "factor": 0.5,
                "jitter": 0,
                "init_delay_ms": 25,
                "detail": true,
                "seed": 3,
                "backoff": "fixed"
            }"#,
        )
        .unwrap();

        let policy = settings.into_policy::<String>();
        assert_eq!(policy.attempts(), 7);
        assert_eq!(policy.factor(), 0.5);
        assert_eq!(policy.jitter(), 0.0);
        assert_eq!(policy.init_delay(), Duration::from_millis(25));
        assert!(policy.detail());
        assert_eq!(policy.seed(), Some(3));
        assert!(matches!(policy.backoff(), Backoff::Fixed));
    }

    #[test]
    fn test_backoff_kind_names() {
        let kind: BackoffKind = serde_json::from_str(r#""exponential_random""#).unwrap();
        assert_eq!(kind, BackoffKind::ExponentialRandom);
        assert_eq!(
            serde_json::to_string(&BackoffKind::Exponential).unwrap(),
            r#""exponential""#
        );
        assert!(serde_json::from_str::<BackoffKind>(r#""linear""#).is_err());
    }

    #[test]
    fn test_invalid_values_survive_until_normalized() {
        let settings = RetrySettings {
            attempts: 0,
            init_delay_ms: 0,
            ..RetrySettings::default()
        };
        let policy = settings.into_policy::<()>();
        assert_eq!(policy.attempts(), 0);

        let policy = policy.normalize();
        assert_eq!(policy.attempts(), DEFAULT_ATTEMPTS);
        assert_eq!(policy.init_delay(), DEFAULT_INIT_DELAY);
    }
}
