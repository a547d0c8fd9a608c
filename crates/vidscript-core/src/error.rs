//! Error taxonomy for Vidscript
//!
//! Every failure the fallback engine reasons about is a single [`Error`] value
//! tagged with an [`ErrorKind`]. The kind fixes the machine code family, the
//! log severity and (except for generic service errors) the retryability of
//! the error at construction time. Errors carry two messages: a technical one
//! for logs and a `user_message` that is safe to show to end users and never
//! names vendors or internal identifiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// Boxed lower-level error kept as the `cause` of a taxonomy error
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Free-form error context (`service`, `statusCode`, `retryAfter`, ...)
pub type Context = Map<String, Value>;

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Closed set of error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Transport-level failure talking to a provider
    Network,
    /// An operation exceeded its time budget
    Timeout,
    /// Generic provider failure; retryability decided by the caller
    Service,
    /// Provider (or a whole capability) is currently unavailable
    ServiceUnavailable,
    /// Provider rejected the request because of request frequency
    RateLimit,
    /// Provider quota is used up; retrying will not help
    QuotaExceeded,
    /// Credentials were rejected
    Authentication,
    /// Credentials are missing, invalid or expired
    ApiKeyInvalid,
    /// Input failed validation
    Validation,
    /// Data could not be parsed
    Parse,
    /// Non-retryable domain failure
    Business,
    /// The requested video does not exist
    VideoNotFound,
    /// A video processing stage failed
    VideoProcessing,
    /// Speech-to-text produced no usable result
    Transcription,
    /// Internal failure of this system
    System,
    /// A local resource (disk, memory, workers) ran out
    ResourceExhausted,
    /// The engine itself is misconfigured
    Configuration,
}

impl ErrorKind {
    /// Type-style name used in structured logs
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Network => "NetworkError",
            ErrorKind::Timeout => "TimeoutError",
            ErrorKind::Service => "ServiceError",
            ErrorKind::ServiceUnavailable => "ServiceUnavailableError",
            ErrorKind::RateLimit => "RateLimitError",
            ErrorKind::QuotaExceeded => "QuotaExceededError",
            ErrorKind::Authentication => "AuthenticationError",
            ErrorKind::ApiKeyInvalid => "ApiKeyInvalidError",
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Parse => "ParseError",
            ErrorKind::Business => "BusinessError",
            ErrorKind::VideoNotFound => "VideoNotFoundError",
            ErrorKind::VideoProcessing => "VideoProcessingError",
            ErrorKind::Transcription => "TranscriptionError",
            ErrorKind::System => "SystemError",
            ErrorKind::ResourceExhausted => "ResourceExhaustedError",
            ErrorKind::Configuration => "ConfigurationError",
        }
    }

    /// Whether this kind belongs to the service family
    pub fn is_service_family(self) -> bool {
        matches!(
            self,
            ErrorKind::Service
                | ErrorKind::ServiceUnavailable
                | ErrorKind::RateLimit
                | ErrorKind::QuotaExceeded
        )
    }

    /// Log severity for errors of this kind
    pub fn severity(self) -> Severity {
        if matches!(self, ErrorKind::System | ErrorKind::ResourceExhausted) {
            Severity::Critical
        } else if self.is_service_family() {
            Severity::Warning
        } else {
            Severity::Error
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Severity levels for errors and warnings
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Informational, no action required
    Info,
    /// Warning, should be reviewed
    Warning,
    /// Error, operation failed
    Error,
    /// Critical, the system itself is unhealthy
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Main error type for Vidscript operations
///
/// Values are immutable once built: the constructors fix `kind`, `code`,
/// both messages and `retryable`. Builder methods only add context and a
/// cause, and never overwrite context keys injected by the constructor.
#[derive(Debug, thiserror::Error)]
#[error("{code}: {message}")]
pub struct Error {
    kind: ErrorKind,
    code: String,
    message: String,
    user_message: String,
    retryable: bool,
    context: Context,
    timestamp: DateTime<Utc>,
    #[source]
    cause: Option<BoxError>,
}

impl Error {
    fn new(
        kind: ErrorKind,
        code: impl Into<String>,
        message: impl Into<String>,
        user_message: impl Into<String>,
        retryable: bool,
        context: Context,
    ) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            user_message: user_message.into(),
            retryable,
            context,
            timestamp: Utc::now(),
            cause: None,
        }
    }

    // ============= network =============

    /// Transport-level failure
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::Network,
            "NETWORK_ERROR",
            message,
            "A network problem occurred. Please check your connection and try again.",
            true,
            Context::new(),
        )
    }

    /// An operation ran out of time
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        let operation = operation.into();
        Self::new(
            ErrorKind::Timeout,
            "TIMEOUT_ERROR",
            format!("Operation timed out: {} ({}ms)", operation, timeout_ms),
            "Processing took too long. Please try again later.",
            true,
            context_of([("operation", json!(operation)), ("timeoutMs", json!(timeout_ms))]),
        )
    }

    // ============= service =============

    /// Generic provider failure with an explicit code and retryability
    pub fn service(
        code: impl Into<String>,
        service: impl Into<String>,
        message: impl Into<String>,
        user_message: impl Into<String>,
        status_code: Option<u16>,
        retryable: bool,
    ) -> Self {
        Self::new(
            ErrorKind::Service,
            code,
            message,
            user_message,
            retryable,
            service_context(&service.into(), status_code),
        )
    }

    /// Provider or capability is unavailable
    pub fn service_unavailable(service: impl Into<String>, reason: Option<&str>) -> Self {
        let service = service.into();
        let message = match reason {
            Some(reason) => format!("Service unavailable: {} - {}", service, reason),
            None => format!("Service unavailable: {}", service),
        };
        Self::new(
            ErrorKind::ServiceUnavailable,
            "SERVICE_UNAVAILABLE",
            message,
            "The service is temporarily unavailable. Please try again shortly.",
            true,
            service_context(&service, Some(503)),
        )
    }

    /// Provider throttled the request; `retry_after` is in seconds
    pub fn rate_limit(service: impl Into<String>, retry_after: Option<u64>) -> Self {
        let service = service.into();
        let mut context = service_context(&service, Some(429));
        // always present, even when the provider gave no hint
        context.insert("retryAfter".to_string(), json!(retry_after));
        Self::new(
            ErrorKind::RateLimit,
            "RATE_LIMIT_ERROR",
            format!("API rate limit exceeded: {}", service),
            "Too many requests. Please wait a moment and try again.",
            true,
            context,
        )
    }

    /// Provider quota exhausted
    pub fn quota_exceeded(service: impl Into<String>, quota_type: impl Into<String>) -> Self {
        let service = service.into();
        let quota_type = quota_type.into();
        let mut context = service_context(&service, Some(429));
        context.insert("quotaType".to_string(), json!(quota_type));
        Self::new(
            ErrorKind::QuotaExceeded,
            "QUOTA_EXCEEDED",
            format!("Quota exhausted for {}: {}", service, quota_type),
            "Today's quota has been used up. Please try again tomorrow or contact an administrator.",
            false,
            context,
        )
    }

    // ============= authentication =============

    /// Credentials rejected by a provider
    pub fn authentication(service: impl Into<String>, reason: Option<&str>) -> Self {
        let service = service.into();
        let message = match reason {
            Some(reason) => format!("Authentication failed: {} - {}", service, reason),
            None => format!("Authentication failed: {}", service),
        };
        Self::new(
            ErrorKind::Authentication,
            "AUTH_ERROR",
            message,
            "Authentication failed. Please check the service credentials configuration.",
            false,
            context_of([("service", json!(service))]),
        )
    }

    /// API key missing, invalid or expired
    pub fn api_key_invalid(service: impl Into<String>) -> Self {
        let service = service.into();
        Self::new(
            ErrorKind::ApiKeyInvalid,
            "INVALID_API_KEY",
            format!("Authentication failed: {} - API key invalid or expired", service),
            "The API key is invalid or has expired.",
            false,
            context_of([("service", json!(service))]),
        )
    }

    // ============= data =============

    /// Input validation failure
    pub fn validation(message: impl Into<String>, field: Option<&str>, value: Option<Value>) -> Self {
        Self::new(
            ErrorKind::Validation,
            "VALIDATION_ERROR",
            message,
            "The input is not in a valid format. Please check it and try again.",
            false,
            context_of([("field", json!(field)), ("value", value.unwrap_or(Value::Null))]),
        )
    }

    /// Data could not be parsed
    pub fn parse(data_type: impl Into<String>, reason: Option<&str>) -> Self {
        let data_type = data_type.into();
        let message = match reason {
            Some(reason) => format!("Failed to parse {}: {}", data_type, reason),
            None => format!("Failed to parse {}", data_type),
        };
        Self::new(
            ErrorKind::Parse,
            "PARSE_ERROR",
            message,
            "The data could not be read. Please check the input format.",
            false,
            context_of([("dataType", json!(data_type))]),
        )
    }

    // ============= business =============

    /// Non-retryable domain failure with a custom code
    pub fn business(
        code: impl Into<String>,
        message: impl Into<String>,
        user_message: impl Into<String>,
    ) -> Self {
        Self::new(ErrorKind::Business, code, message, user_message, false, Context::new())
    }

    /// The requested video does not exist
    pub fn video_not_found(video_id: impl Into<String>, platform: impl Into<String>) -> Self {
        let video_id = video_id.into();
        Self::new(
            ErrorKind::VideoNotFound,
            "VIDEO_NOT_FOUND",
            format!("Video not found: {}", video_id),
            "The video does not exist or has been removed.",
            false,
            context_of([("videoId", json!(video_id)), ("platform", json!(platform.into()))]),
        )
    }

    /// A processing stage failed for a video
    pub fn video_processing(stage: impl Into<String>, reason: impl AsRef<str>) -> Self {
        let stage = stage.into();
        Self::new(
            ErrorKind::VideoProcessing,
            "VIDEO_PROCESSING_ERROR",
            format!("Video processing failed [{}]: {}", stage, reason.as_ref()),
            "Video processing failed. Please try again later.",
            false,
            context_of([("stage", json!(stage))]),
        )
    }

    /// Speech-to-text produced nothing usable
    pub fn transcription(reason: impl AsRef<str>) -> Self {
        Self::new(
            ErrorKind::Transcription,
            "TRANSCRIPTION_ERROR",
            format!("Transcription failed: {}", reason.as_ref()),
            "Speech recognition failed. Please check that the video contains audible speech.",
            false,
            Context::new(),
        )
    }

    // ============= system =============

    /// Internal failure
    pub fn system(message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::System,
            "SYSTEM_ERROR",
            message,
            "An internal error occurred. Please contact support.",
            true,
            Context::new(),
        )
    }

    /// Local resource exhausted
    pub fn resource_exhausted(resource: impl Into<String>) -> Self {
        let resource = resource.into();
        Self::new(
            ErrorKind::ResourceExhausted,
            "RESOURCE_EXHAUSTED",
            format!("Resource exhausted: {}", resource),
            "The system is short on resources. Please try again later.",
            true,
            context_of([("resource", json!(resource))]),
        )
    }

    /// The engine is misconfigured
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::Configuration,
            "CONFIGURATION_ERROR",
            message,
            "The service is not configured correctly. Please contact support.",
            false,
            Context::new(),
        )
    }

    // ============= builders =============

    /// Add a context entry; keys injected by the constructor win
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.entry(key.into()).or_insert_with(|| value.into());
        self
    }

    /// Merge caller-supplied context; keys injected by the constructor win
    pub fn extend_context(mut self, context: Context) -> Self {
        for (key, value) in context {
            self.context.entry(key).or_insert(value);
        }
        self
    }

    /// Attach the lower-level error that caused this one
    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    // ============= accessors =============

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Short machine token such as `RATE_LIMIT_ERROR`
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Technical message for logs
    pub fn message(&self) -> &str {
        &self.message
    }

    /// End-user-safe message
    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Service named in the context, if any
    pub fn service_name(&self) -> Option<&str> {
        self.context.get("service").and_then(Value::as_str)
    }

    /// HTTP status recorded in the context, if any
    pub fn status_code(&self) -> Option<u16> {
        self.context
            .get("statusCode")
            .and_then(Value::as_u64)
            .and_then(|code| u16::try_from(code).ok())
    }

    /// Server-specified wait in seconds; only rate-limit errors carry one
    pub fn retry_after(&self) -> Option<u64> {
        if self.kind != ErrorKind::RateLimit {
            return None;
        }
        self.context.get("retryAfter").and_then(Value::as_u64)
    }

    /// Structured representation for logs
    pub fn to_json(&self) -> Value {
        let mut value = json!({
            "name": self.kind.name(),
            "code": self.code,
            "message": self.message,
            "userMessage": self.user_message,
            "timestamp": self.timestamp.to_rfc3339(),
            "retryable": self.retryable,
            "context": self.context,
        });
        if let Some(cause) = &self.cause {
            value["cause"] = json!(cause.to_string());
        }
        value
    }
}

/// Caller-facing error body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    /// Always the user message, never the technical one
    pub message: String,
    pub retryable: bool,
}

/// Shape used by HTTP-facing layers to surface a terminal error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorBody,
}

impl From<&Error> for ErrorResponse {
    fn from(error: &Error) -> Self {
        Self {
            success: false,
            error: ErrorBody {
                code: error.code.clone(),
                message: error.user_message.clone(),
                retryable: error.retryable,
            },
        }
    }
}

fn context_of<const N: usize>(entries: [(&str, Value); N]) -> Context {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

fn service_context(service: &str, status_code: Option<u16>) -> Context {
    context_of([("service", json!(service)), ("statusCode", json!(status_code))])
}
