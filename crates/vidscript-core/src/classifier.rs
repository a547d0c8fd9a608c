//! Error classification: retryability, user messages, retry delays and logging
//!
//! All functions accept any `std::error::Error`. Taxonomy errors are found by
//! walking the `source()` chain, so an [`Error`] wrapped by `anyhow` context or
//! by another error type is still classified by its own flags. Errors from
//! outside the taxonomy fall back to a best-effort heuristic: a fixed list of
//! transient network markers in the message, plus the equivalent
//! `std::io::ErrorKind`s. The heuristic is not exhaustive.

use crate::error::{Context, Error, Severity};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use serde_json::{json, Value};
use std::error::Error as StdError;
use std::io;
use std::time::Duration;
use tracing::{error, warn};

/// Message markers of transient network failures
pub const TRANSIENT_MARKERS: [&str; 5] = [
    "ECONNREFUSED",
    "ETIMEDOUT",
    "ENOTFOUND",
    "ENETUNREACH",
    "socket hang up",
];

/// Shown for anything outside the taxonomy
pub const GENERIC_USER_MESSAGE: &str =
    "Something went wrong while processing your request. Please try again later.";

/// Code reported for errors outside the taxonomy
pub const UNCLASSIFIED_CODE: &str = "UNKNOWN_ERROR";

pub const BASE_RETRY_DELAY: Duration = Duration::from_millis(1_000);
pub const MAX_RETRY_DELAY: Duration = Duration::from_millis(60_000);
const JITTER_FACTOR: f64 = 0.2;

/// Structured record emitted by [`ErrorHandler::log_error`]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorLogRecord {
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub error_details: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,
}

/// Pure classification helpers over arbitrary errors
pub struct ErrorHandler;

impl ErrorHandler {
    /// First taxonomy error in the source chain, if any
    pub fn find<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a Error> {
        chain(err).find_map(|e| e.downcast_ref::<Error>())
    }

    /// Whether retrying the same operation may succeed
    pub fn is_retryable(err: &(dyn StdError + 'static)) -> bool {
        if let Some(taxonomy) = Self::find(err) {
            return taxonomy.is_retryable();
        }

        chain(err).any(|e| {
            let transient_io = e
                .downcast_ref::<io::Error>()
                .map(|io| is_transient_io(io.kind()))
                .unwrap_or(false);
            transient_io || {
                let message = e.to_string();
                TRANSIENT_MARKERS.iter().any(|marker| message.contains(marker))
            }
        })
    }

    /// Message safe to show to an end user
    pub fn user_message<'a>(err: &'a (dyn StdError + 'static)) -> &'a str {
        Self::find(err)
            .map(Error::user_message)
            .unwrap_or(GENERIC_USER_MESSAGE)
    }

    /// Machine code, or [`UNCLASSIFIED_CODE`] outside the taxonomy
    pub fn code<'a>(err: &'a (dyn StdError + 'static)) -> &'a str {
        Self::find(err).map(Error::code).unwrap_or(UNCLASSIFIED_CODE)
    }

    /// Log severity of an error
    pub fn severity(err: &(dyn StdError + 'static)) -> Severity {
        Self::find(err)
            .map(|taxonomy| taxonomy.kind().severity())
            .unwrap_or(Severity::Error)
    }

    /// Delay before retry number `attempt` (0-based)
    pub fn retry_delay(err: &(dyn StdError + 'static), attempt: u32) -> Duration {
        Self::retry_delay_with(err, attempt, &mut rand::thread_rng())
    }

    /// [`retry_delay`](Self::retry_delay) with an explicit random source
    ///
    /// A rate-limit error with a positive `retryAfter` is honoured exactly.
    /// Everything else gets `min(base * 2^attempt, max)` with symmetric
    /// jitter, floored to whole milliseconds.
    pub fn retry_delay_with<R: Rng + ?Sized>(
        err: &(dyn StdError + 'static),
        attempt: u32,
        rng: &mut R,
    ) -> Duration {
        if let Some(retry_after) = Self::find(err).and_then(Error::retry_after) {
            if retry_after > 0 {
                return Duration::from_secs(retry_after);
            }
        }

        let capped = Self::backoff_ceiling(attempt).as_millis() as f64;
        let jitter = capped * JITTER_FACTOR * (rng.gen::<f64>() - 0.5);
        Duration::from_millis((capped + jitter).floor() as u64)
    }

    /// Un-jittered backoff for `attempt`: `min(base * 2^attempt, max)`
    pub fn backoff_ceiling(attempt: u32) -> Duration {
        // 2^16 seconds is far past the cap already
        let factor = 1u64 << attempt.min(16);
        let base = BASE_RETRY_DELAY.as_millis() as u64;
        Duration::from_millis(base.saturating_mul(factor)).min(MAX_RETRY_DELAY)
    }

    /// Build the structured record for an error
    pub fn log_record(err: &(dyn StdError + 'static), context: Option<&Context>) -> ErrorLogRecord {
        let error_details = match Self::find(err) {
            Some(taxonomy) => taxonomy.to_json(),
            None => json!({
                "name": "Error",
                "message": err.to_string(),
                "causes": chain(err).skip(1).map(|e| e.to_string()).collect::<Vec<_>>(),
            }),
        };

        ErrorLogRecord {
            timestamp: Utc::now(),
            severity: Self::severity(err),
            error_details,
            context: context.cloned(),
        }
    }

    /// Emit an error on the channel matching its severity
    pub fn log_error(err: &(dyn StdError + 'static), context: Option<&Context>) {
        let record = Self::log_record(err, context);
        let payload = serde_json::to_string(&record)
            .unwrap_or_else(|_| "[failed to serialize]".to_string());

        match record.severity {
            Severity::Critical => {
                error!(severity = "critical", record = %payload, "[CRITICAL] {}", err)
            }
            Severity::Warning => {
                warn!(severity = "warning", record = %payload, "[SERVICE] {}", err)
            }
            _ => error!(severity = "error", record = %payload, "[ERROR] {}", err),
        }
    }
}

fn chain<'a>(err: &'a (dyn StdError + 'static)) -> impl Iterator<Item = &'a (dyn StdError + 'static)> {
    std::iter::successors(Some(err), |e: &&'a (dyn StdError + 'static)| (*e).source())
}

fn is_transient_io(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::TimedOut
            | io::ErrorKind::BrokenPipe
    )
}
