use std::collections::BTreeSet;
use std::time::Duration;

use serde::Deserialize;

use crate::{ApiClientError, Result};

/// Status codes retried by default.
pub const DEFAULT_RETRYABLE_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Exponential backoff policy applied to retryable statuses.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryPolicy {
    /// Total number of physical attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    #[serde(with = "millis")]
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    #[serde(with = "millis")]
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub retryable_statuses: BTreeSet<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1_000),
            max_delay: Duration::from_millis(10_000),
            backoff_multiplier: 2.0,
            retryable_statuses: DEFAULT_RETRYABLE_STATUSES.into_iter().collect(),
        }
    }
}

impl RetryPolicy {
    /// Rejects policies that cannot produce a sane schedule.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(ApiClientError::InvalidConfig(
                "max_attempts must be at least 1".to_owned(),
            ));
        }
        if self.max_delay < self.initial_delay {
            return Err(ApiClientError::InvalidConfig(format!(
                "max_delay ({} ms) is lower than initial_delay ({} ms)",
                self.max_delay.as_millis(),
                self.initial_delay.as_millis()
            )));
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(ApiClientError::InvalidConfig(format!(
                "backoff_multiplier must be a finite value >= 1, got {}",
                self.backoff_multiplier
            )));
        }
        Ok(())
    }

    /// Whether `status` is in [`RetryPolicy::retryable_statuses`].
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }

    /// Delay to wait after failed attempt `attempt` (1-indexed).
    ///
    /// `min(initial_delay * multiplier^(attempt - 1), max_delay)`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let factor = self.backoff_multiplier.powi(exp);
        let delay_ns = self.initial_delay.as_nanos() as f64 * factor;

        if !delay_ns.is_finite() || delay_ns >= self.max_delay.as_nanos() as f64 {
            return self.max_delay;
        }
        Duration::from_nanos(delay_ns.round() as u64)
    }
}

pub(crate) mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
