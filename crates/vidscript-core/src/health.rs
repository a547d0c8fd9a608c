//! Per-provider circuit breaking
//!
//! Each (capability, provider) pair has a [`ProviderStatus`] that flips
//! between available and unavailable. A provider becomes unavailable after
//! `max_failures` failures or once its error rate exceeds the threshold, and
//! becomes available again only when `reset_timeout` has elapsed since its
//! last failure (checked lazily in [`ProviderHealthTracker::is_available`]) or
//! when an operator resets it.
//!
//! The error rate is an exponentially weighted moving average: every failure
//! maps `rate → 0.9 * rate + 0.1` and every success maps `rate → 0.9 * rate`.
//! It is a coarse health signal, not an SLO estimator.
//!
//! Statuses live in a [`DashMap`]; every read-modify-write of one status runs
//! under that entry's shard lock, so concurrent success and failure records
//! for the same key never lose updates.

use crate::classifier::ErrorHandler;
use crate::config::FallbackConfig;
use crate::types::ProviderKey;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error as StdError;
use tokio::time::Instant;
use tracing::{error, info};

const DECAY: f64 = 0.9;
const FAILURE_WEIGHT: f64 = 0.1;

/// Health of one provider for one capability
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub available: bool,
    pub last_check_time: DateTime<Utc>,
    pub failure_count: u32,
    pub last_failure_time: Option<DateTime<Utc>>,
    /// Exponentially weighted error rate in [0, 1]
    pub error_rate: f64,
    #[serde(skip)]
    last_failure_at: Option<Instant>,
}

impl ProviderStatus {
    fn fresh() -> Self {
        Self {
            available: true,
            last_check_time: Utc::now(),
            failure_count: 0,
            last_failure_time: None,
            error_rate: 0.0,
            last_failure_at: None,
        }
    }

    fn reset(&mut self) {
        self.available = true;
        self.failure_count = 0;
        self.error_rate = 0.0;
    }
}

/// Read-only snapshot of every known provider, ordered by key
pub type ServiceReport = BTreeMap<ProviderKey, ProviderStatus>;

/// Injectable store of provider health
#[derive(Debug)]
pub struct ProviderHealthTracker {
    config: FallbackConfig,
    statuses: DashMap<ProviderKey, ProviderStatus>,
}

impl Default for ProviderHealthTracker {
    fn default() -> Self {
        Self::new(FallbackConfig::default())
    }
}

impl ProviderHealthTracker {
    /// Create an empty tracker
    pub fn new(config: FallbackConfig) -> Self {
        Self {
            config,
            statuses: DashMap::new(),
        }
    }

    pub fn config(&self) -> &FallbackConfig {
        &self.config
    }

    /// Whether the provider may be called now
    ///
    /// Unknown keys are created in the available state. An unavailable
    /// provider whose last failure is older than `reset_timeout` is reset and
    /// reported available.
    pub fn is_available(&self, key: &ProviderKey) -> bool {
        let mut status = self
            .statuses
            .entry(key.clone())
            .or_insert_with(ProviderStatus::fresh);

        if !status.available {
            let cooled_down = status
                .last_failure_at
                .map(|at| at.elapsed() > self.config.reset_timeout)
                .unwrap_or(false);
            if cooled_down {
                status.reset();
                info!(provider = %key, "Provider reset after cool-down");
            }
        }

        status.available
    }

    /// Record a successful call
    ///
    /// Decays the error rate and touches `last_check_time`; availability and
    /// the failure count are left alone.
    pub fn record_success(&self, key: &ProviderKey) {
        let mut status = self
            .statuses
            .entry(key.clone())
            .or_insert_with(ProviderStatus::fresh);

        status.error_rate *= DECAY;
        status.last_check_time = Utc::now();
    }

    /// Record a failed call and return the updated status
    pub fn record_failure(&self, key: &ProviderKey, err: &(dyn StdError + 'static)) -> ProviderStatus {
        let mut status = self
            .statuses
            .entry(key.clone())
            .or_insert_with(ProviderStatus::fresh);

        status.failure_count = status.failure_count.saturating_add(1);
        status.last_failure_time = Some(Utc::now());
        status.last_failure_at = Some(Instant::now());
        status.error_rate = (status.error_rate * DECAY + FAILURE_WEIGHT).min(1.0);

        let tripped = status.failure_count >= self.config.max_failures
            || status.error_rate > self.config.error_rate_threshold;
        if tripped && status.available {
            status.available = false;
            error!(
                provider = %key,
                failure_count = status.failure_count,
                error_rate = status.error_rate,
                code = ErrorHandler::code(err),
                "Provider marked unavailable"
            );
        }

        status.clone()
    }

    /// Current status of one provider, if it has been seen
    pub fn status(&self, key: &ProviderKey) -> Option<ProviderStatus> {
        self.statuses.get(key).map(|status| status.clone())
    }

    /// Snapshot of every provider seen so far
    pub fn report(&self) -> ServiceReport {
        self.statuses
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Operator reset: force the provider available with clean counters
    ///
    /// Returns false when the provider has never been seen.
    pub fn reset(&self, key: &ProviderKey) -> bool {
        match self.statuses.get_mut(key) {
            Some(mut status) => {
                status.reset();
                info!(provider = %key, "Provider manually reset");
                true
            }
            None => false,
        }
    }
}
