//! Fallback engine configuration

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Circuit-breaker and dispatch settings for one manager instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Failures before a provider is marked unavailable
    pub max_failures: u32,

    /// Time after the last failure before an unavailable provider is tried again
    pub reset_timeout: Duration,

    /// Error rate above which a provider is marked unavailable
    pub error_rate_threshold: f64,

    /// Informational only; availability is evaluated lazily on access
    pub check_interval: Duration,

    /// Upper bound on the wall-clock time of one fallback chain
    pub overall_deadline: Option<Duration>,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            max_failures: 3,
            reset_timeout: Duration::from_millis(60_000),
            error_rate_threshold: 0.5,
            check_interval: Duration::from_millis(30_000),
            overall_deadline: None,
        }
    }
}

impl FallbackConfig {
    /// Set the failure threshold
    pub fn with_max_failures(mut self, max_failures: u32) -> Self {
        self.max_failures = max_failures;
        self
    }

    /// Set the reset timeout
    pub fn with_reset_timeout(mut self, reset_timeout: Duration) -> Self {
        self.reset_timeout = reset_timeout;
        self
    }

    /// Set the error rate threshold
    pub fn with_error_rate_threshold(mut self, threshold: f64) -> Self {
        self.error_rate_threshold = threshold;
        self
    }

    /// Bound the total time of one fallback chain
    pub fn with_overall_deadline(mut self, deadline: Duration) -> Self {
        self.overall_deadline = Some(deadline);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_failures == 0 {
            return Err(Error::configuration("max_failures must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.error_rate_threshold) {
            return Err(Error::configuration(format!(
                "error_rate_threshold must be within [0, 1], got {}",
                self.error_rate_threshold
            )));
        }
        if self.overall_deadline == Some(Duration::ZERO) {
            return Err(Error::configuration("overall_deadline must be positive"));
        }
        Ok(())
    }
}
