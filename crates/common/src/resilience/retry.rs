//! Retry policy for wrapped calls
//!
//! A [`RetryPolicy`] is immutable for the duration of one call. It bounds the
//! number of invocations to `max_retries + 1`, caps each attempt with
//! `timeout`, and spaces attempts according to its [`BackoffStrategy`].
//! Whether a failure is retried at all depends only on its
//! [`ErrorKind`]: non-transient kinds stop immediately.

use std::time::Duration;

use balance_domain::constants::{
    DEFAULT_CALL_TIMEOUT_MS, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY_MS,
};
use balance_domain::SafeCallConfig;
use thiserror::Error;

use crate::error::ErrorKind;

/// Errors raised while building a retry policy
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    /// The retry policy configuration is invalid
    #[error("Invalid retry configuration: {message}")]
    InvalidConfiguration { message: String },
}

/// Decision for whether to retry an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait for the given delay, then attempt again
    Retry(Duration),
    /// Don't retry the operation
    Stop,
}

/// Backoff strategy for calculating retry delays from the base delay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// Same delay before every retry
    Fixed,
    /// `base * n` before the n-th retry (1x, 2x, 3x ...)
    #[default]
    Linear,
    /// `base * 2^(n-1)` before the n-th retry, capped at `max_delay`
    Exponential { max_delay: Duration },
}

impl BackoffStrategy {
    /// Delay before retry number `retry` (1-based)
    pub fn delay(&self, base: Duration, retry: u32) -> Duration {
        let retry = retry.max(1);
        match self {
            Self::Fixed => base,
            Self::Linear => base.saturating_mul(retry),
            Self::Exponential { max_delay } => {
                let factor = 2u32.saturating_pow(retry - 1);
                base.saturating_mul(factor).min(*max_delay)
            }
        }
    }
}

/// Retry, timeout and backoff settings for one call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Unit delay fed to the backoff strategy
    pub base_delay: Duration,
    /// Deadline for a single attempt
    pub timeout: Duration,
    pub backoff: BackoffStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            timeout: Duration::from_millis(DEFAULT_CALL_TIMEOUT_MS),
            backoff: BackoffStrategy::Linear,
        }
    }
}

impl From<&SafeCallConfig> for RetryPolicy {
    fn from(config: &SafeCallConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.retry_delay(),
            timeout: config.timeout(),
            backoff: BackoffStrategy::Linear,
        }
    }
}

impl RetryPolicy {
    /// Create a policy builder starting from the dashboard defaults
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::new()
    }

    /// Upper bound on operation invocations
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Decide what follows a failed attempt.
    ///
    /// `attempts_made` counts invocations so far, including the one that
    /// just failed.
    pub fn decide(&self, kind: ErrorKind, attempts_made: u32) -> RetryDecision {
        if !kind.is_transient() || attempts_made >= self.max_attempts() {
            return RetryDecision::Stop;
        }
        RetryDecision::Retry(self.backoff.delay(self.base_delay, attempts_made))
    }

    /// Validate the policy
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.timeout.is_zero() {
            return Err(PolicyError::InvalidConfiguration {
                message: "timeout must be greater than 0".to_string(),
            });
        }
        if let BackoffStrategy::Exponential { max_delay } = self.backoff {
            if max_delay < self.base_delay {
                return Err(PolicyError::InvalidConfiguration {
                    message: "exponential max_delay must not be below base_delay".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Builder for RetryPolicy with fluent API
#[derive(Debug, Default)]
pub struct RetryPolicyBuilder {
    policy: RetryPolicy,
}

impl RetryPolicyBuilder {
    pub fn new() -> Self {
        Self { policy: RetryPolicy::default() }
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.policy.max_retries = retries;
        self
    }

    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.policy.base_delay = delay;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.policy.timeout = timeout;
        self
    }

    pub fn fixed_backoff(mut self) -> Self {
        self.policy.backoff = BackoffStrategy::Fixed;
        self
    }

    pub fn linear_backoff(mut self) -> Self {
        self.policy.backoff = BackoffStrategy::Linear;
        self
    }

    pub fn exponential_backoff(mut self, max_delay: Duration) -> Self {
        self.policy.backoff = BackoffStrategy::Exponential { max_delay };
        self
    }

    pub fn build(self) -> Result<RetryPolicy, PolicyError> {
        self.policy.validate()?;
        Ok(self.policy)
    }
}
