//! Retry policy for calls to the GraphQL endpoint.
//!
//! Implements exponential backoff with configurable parameters.

use super::error::TransportError;
use crate::config::RetrySettings;
use std::time::Duration;

/// Retry policy implementing exponential backoff.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one. Always at least 1.
    pub max_attempts: u32,
    /// Timeout applied to each individual attempt.
    pub attempt_timeout: Duration,
    /// Delay before the second attempt, in milliseconds.
    pub initial_backoff_ms: u64,
    /// Cap for exponential growth, in milliseconds.
    pub max_backoff_ms: u64,
    /// Multiplier applied to the delay after each failed attempt.
    pub backoff_multiplier: f64,
}

impl RetryPolicy {
    /// Create a new RetryPolicy from configuration settings.
    pub fn new(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            attempt_timeout: Duration::from_secs(settings.attempt_timeout_secs),
            initial_backoff_ms: settings.initial_backoff_ms,
            max_backoff_ms: settings.max_backoff_ms,
            backoff_multiplier: settings.backoff_multiplier,
        }
    }

    /// Policy that tries once and never waits.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
            ..Default::default()
        }
    }

    /// Check if another attempt should follow a failed one.
    ///
    /// `attempts_made` counts the attempts already performed (1 after the first).
    pub fn should_retry(&self, error: &TransportError, attempts_made: u32) -> bool {
        error.is_retryable() && attempts_made < self.max_attempts
    }

    /// Delay to wait after `attempts_made` failed attempts.
    ///
    /// Uses `initial_backoff * multiplier^(attempts_made - 1)`, capped at `max_backoff_ms`.
    pub fn backoff_ms(&self, attempts_made: u32) -> u64 {
        let exponent = attempts_made.saturating_sub(1).min(i32::MAX as u32) as i32;
        let backoff = self.initial_backoff_ms as f64 * self.backoff_multiplier.powi(exponent);
        backoff.min(self.max_backoff_ms as f64) as u64
    }

    pub fn backoff(&self, attempts_made: u32) -> Duration {
        Duration::from_millis(self.backoff_ms(attempts_made))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(&RetrySettings::default())
    }
}
