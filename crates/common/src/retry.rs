//! Retry policies.
//!
//! A policy only computes delays; callers own the loop because what counts as
//! a retryable outcome differs per call site.

use std::time::Duration;

/// How the delay grows between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// `base * attempt`
    Linear,
    /// `base * 2^(attempt - 1)`
    Exponential,
}

/// Retry budget and backoff schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 means no retries)
    pub max_retries: u32,

    /// Delay unit
    pub base_delay: Duration,

    /// Upper bound on any single delay
    pub max_delay: Duration,

    /// Growth strategy
    pub strategy: BackoffStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(3, Duration::from_millis(100))
    }
}

impl RetryPolicy {
    /// Linear backoff
    pub fn linear(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
            strategy: BackoffStrategy::Linear,
        }
    }

    /// Exponential backoff
    pub fn exponential(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
            strategy: BackoffStrategy::Exponential,
        }
    }

    /// No retries at all
    pub fn no_retry() -> Self {
        Self::linear(0, Duration::ZERO)
    }

    /// Set the maximum delay between retries.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Total attempts including the first
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay before retry number `retry` (1-based). Zero for `retry == 0`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let factor = match self.strategy {
            BackoffStrategy::Linear => retry,
            BackoffStrategy::Exponential => 2u32.saturating_pow(retry - 1),
        };
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}
