use crate::config::QueueConfig;
use chrono::{DateTime, Utc};
use rand::Rng;
use std::time::Duration;

/// Exponential backoff with bounded jitter
///
/// The un-jittered delay for attempt `n` is `base * 2^(n-1)`, capped at
/// `max`. Jitter adds a random amount in `[0, jitter_ratio * delay)`. With
/// `jitter_ratio < 1` a jittered delay never reaches the next attempt's
/// un-jittered delay while below the cap. Once the cap is reached no jitter
/// is added.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    base: Duration,
    max: Duration,
    jitter_ratio: f64,
}

impl BackoffPolicy {
    pub fn new(base: Duration, max: Duration, jitter_ratio: f64) -> Self {
        Self {
            base,
            max,
            jitter_ratio: jitter_ratio.clamp(0.0, 0.99),
        }
    }

    pub fn from_config(config: &QueueConfig) -> Self {
        Self::new(
            Duration::from_secs(config.backoff_base_secs),
            Duration::from_secs(config.backoff_max_secs),
            config.jitter_ratio,
        )
    }

    /// Un-jittered delay before attempt `attempt + 1`
    ///
    /// `attempt` is the number of failures so far; 0 is treated as 1.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32);
        let base_ms = self.base.as_millis() as u64;
        let max_ms = self.max.as_millis() as u64;
        let delay_ms = base_ms.saturating_mul(1u64 << exponent).min(max_ms);
        Duration::from_millis(delay_ms)
    }

    /// Delay plus random jitter drawn from `rng`
    ///
    /// Jitter stays below the gap to the next attempt's delay, so the result
    /// never reaches `delay(attempt + 1)` and never exceeds `max`.
    pub fn delay_with_jitter<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let delay = self.delay(attempt);
        let gap_ms = self.delay(attempt.max(1).saturating_add(1)).saturating_sub(delay).as_millis() as u64;
        let bound_ms = ((delay.as_millis() as f64 * self.jitter_ratio) as u64).min(gap_ms);
        if bound_ms == 0 {
            return delay;
        }
        delay + Duration::from_millis(rng.gen_range(0..bound_ms))
    }

    /// When a job that has failed `attempt` times becomes claimable again
    pub fn next_eligible_at(&self, attempt: u32, now: DateTime<Utc>) -> DateTime<Utc> {
        let wait = self.delay_with_jitter(attempt, &mut rand::thread_rng());
        now + chrono::Duration::milliseconds(wait.as_millis() as i64)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from_config(&QueueConfig::default())
    }
}

/// How many attempts a job gets and how long it waits between them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: BackoffPolicy,
}

impl RetryPolicy {
    pub fn from_config(config: &QueueConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff: BackoffPolicy::from_config(config),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&QueueConfig::default())
    }
}
