//! Caller-side retry with exponential backoff
//!
//! The fallback chain itself never retries; callers that want to retry a
//! whole capability (or a single provider call) wrap it in
//! [`execute_with_retry`]. Only errors classified as retryable are retried and
//! the delay comes from [`ErrorHandler::retry_delay`].

use crate::classifier::ErrorHandler;
use std::error::Error as StdError;
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

/// Retry policy configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }
}

/// Decision on whether to retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay
    Retry { delay: Duration },
    /// Give up and surface the error
    NoRetry,
}

/// Tracks retries of one operation
#[derive(Debug)]
pub struct RetryHandler {
    policy: RetryPolicy,
    attempts: u32,
}

impl RetryHandler {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, attempts: 0 }
    }

    /// Decide whether to retry after `err`
    pub fn should_retry(&mut self, err: &(dyn StdError + 'static)) -> RetryDecision {
        if self.attempts >= self.policy.max_attempts || !ErrorHandler::is_retryable(err) {
            return RetryDecision::NoRetry;
        }

        let delay = ErrorHandler::retry_delay(err, self.attempts);
        self.attempts += 1;
        RetryDecision::Retry { delay }
    }

    /// Retries granted so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// Run `operation` until it succeeds, fails non-retryably, or the policy is exhausted
pub async fn execute_with_retry<F, Fut, T, E>(mut operation: F, policy: RetryPolicy) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: AsRef<dyn StdError + 'static> + std::fmt::Display,
{
    let mut handler = RetryHandler::new(policy);

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => match handler.should_retry(err.as_ref()) {
                RetryDecision::Retry { delay } => {
                    warn!(
                        attempt = handler.attempts(),
                        delay_ms = delay.as_millis() as u64,
                        "Operation failed, retrying: {}",
                        err
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::NoRetry => {
                    error!(
                        retries = handler.attempts(),
                        "Operation failed, not retrying: {}",
                        err
                    );
                    return Err(err);
                }
            },
        }
    }
}
