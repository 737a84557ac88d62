//! Retry policy and backoff strategies.

use std::time::Duration;

use crate::GatewayError;

/// Retry and timeout bounds for one gateway exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// No retry starts once this much time has passed since the first attempt.
    pub max_retry_interval: Duration,
    /// Ceiling for the whole exchange, retries included.
    pub max_request_time: Duration,
    /// Delay between attempts.
    pub backoff: BackoffStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 20,
            max_retry_interval: Duration::from_secs(40),
            max_request_time: Duration::from_secs(60),
            backoff: BackoffStrategy::Constant(Duration::ZERO),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, max_retry_interval: Duration) -> Self {
        Self {
            max_retries,
            max_retry_interval,
            ..Default::default()
        }
    }

    /// A policy that sends exactly once.
    pub fn no_retry() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_max_request_time(mut self, duration: Duration) -> Self {
        self.max_request_time = duration;
        self
    }

    /// Total number of attempts, the first one included.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Calculate delay for a given attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay_for_attempt(attempt)
    }
}

/// Backoff strategy for retries.
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    /// No delay between retries.
    None,
    /// Constant delay between retries.
    Constant(Duration),
    /// Linear backoff: delay increases by a fixed amount.
    Linear {
        /// Delay increment per attempt.
        delay: Duration,
        /// Maximum delay.
        max: Duration,
    },
    /// Exponential backoff: delay doubles each attempt.
    Exponential {
        /// Initial delay.
        initial: Duration,
        /// Maximum delay.
        max: Duration,
        /// Multiplier (typically 2.0).
        multiplier: f64,
    },
}

impl BackoffStrategy {
    /// Calculate delay for a given attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Constant(d) => *d,
            Self::Linear { delay, max } => {
                let total = delay.saturating_mul(attempt + 1);
                total.min(*max)
            }
            Self::Exponential { initial, max, multiplier } => {
                let factor = multiplier.powi(attempt as i32);
                let millis = (initial.as_millis() as f64 * factor) as u64;
                Duration::from_millis(millis).min(*max)
            }
        }
    }
}

/// Retry strategy trait for custom retry logic.
pub trait RetryStrategy: Send + Sync {
    /// Check if the request should be retried after `attempt` (0-indexed) failed.
    fn should_retry(&self, attempt: u32, elapsed: Duration, error: &GatewayError) -> bool;

    /// Get the delay before the next retry.
    fn retry_delay(&self, attempt: u32) -> Duration;
}

impl RetryStrategy for RetryPolicy {
    fn should_retry(&self, attempt: u32, elapsed: Duration, error: &GatewayError) -> bool {
        error.is_retryable() && attempt < self.max_retries && elapsed < self.max_retry_interval
    }

    fn retry_delay(&self, attempt: u32) -> Duration {
        self.delay_for_attempt(attempt)
    }
}
