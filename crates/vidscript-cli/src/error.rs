//! Error types and handling for the CLI
//!
//! This module provides error types and utilities for handling
//! various failure modes in the CLI application.

use crate::cli::OutputFormat;
use std::io;
use std::path::PathBuf;
use vidscript_core::ErrorResponse;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Exit code for failures that may succeed when retried later (EX_TEMPFAIL)
pub const EXIT_RETRYABLE: i32 = 75;

/// Exit code for failures that will not succeed without a change
pub const EXIT_PERMANENT: i32 = 2;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from the fallback engine or a provider
    #[error("{0}")]
    Core(#[from] vidscript_core::Error),

    /// File not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Invalid file format
    #[error("Invalid file format for {}: expected {} format", path.display(), expected)]
    InvalidFormat { path: PathBuf, expected: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument combination
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML deserialization error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid arguments error
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }

    /// Create a generic error with message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Core(error) if error.is_retryable() => EXIT_RETRYABLE,
            Self::Core(_) => EXIT_PERMANENT,
            Self::Io(_) => 1,
            Self::FileNotFound { .. } => 3,
            Self::InvalidFormat { .. } => 4,
            Self::Config(_) => 5,
            Self::InvalidArgs(_) => 6,
            Self::Json(_) => 12,
            Self::Yaml(_) => 13,
            Self::Toml(_) => 14,
            Self::Other { .. } => 99,
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(self, Self::InvalidArgs(_))
    }
}

/// Format an error for display to the user
///
/// Engine failures show their user-facing message; the internal code and
/// message are added when `verbose` is set. Machine formats render the
/// `{success, error}` response body instead.
pub fn format_error(error: &Error, format: OutputFormat, use_color: bool, verbose: bool) -> String {
    if let Error::Core(core) = error {
        let response = ErrorResponse::from(core);
        let rendered = match format {
            OutputFormat::Human => None,
            OutputFormat::Json => serde_json::to_string(&response).ok(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(&response).ok(),
            OutputFormat::Yaml => serde_yaml::to_string(&response).ok(),
        };
        if format != OutputFormat::Human {
            return rendered.unwrap_or_else(|| core.to_string());
        }

        let mut message = core.user_message().to_string();
        if verbose {
            message.push_str(&format!("\n  code: {}\n  detail: {}", core.code(), core.message()));
        }
        return prefixed(&message, use_color);
    }

    prefixed(&error.to_string(), use_color)
}

fn prefixed(message: &str, use_color: bool) -> String {
    if use_color {
        use colored::Colorize;
        format!("{} {}", "Error:".red().bold(), message)
    } else {
        format!("Error: {}", message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unavailable() -> Error {
        Error::Core(vidscript_core::Error::service_unavailable(
            "transcribe",
            Some("all strategies failed"),
        ))
    }

    #[test]
    fn test_exit_codes_follow_retryability() {
        assert_eq!(unavailable().exit_code(), EXIT_RETRYABLE);

        let validation = Error::Core(vidscript_core::Error::validation("Invalid URL", Some("url"), None));
        assert_eq!(validation.exit_code(), EXIT_PERMANENT);

        assert_eq!(Error::config("bad").exit_code(), 5);
        assert!(Error::invalid_args("x").should_show_help());
    }

    #[test]
    fn test_human_format_shows_user_message() {
        let formatted = format_error(&unavailable(), OutputFormat::Human, false, false);
        assert!(formatted.starts_with("Error: "));
        assert!(!formatted.contains("all strategies failed"));

        let verbose = format_error(&unavailable(), OutputFormat::Human, false, true);
        assert!(verbose.contains("SERVICE_UNAVAILABLE"));
        assert!(verbose.contains("all strategies failed"));
    }

    #[test]
    fn test_machine_format_is_error_response() {
        let formatted = format_error(&unavailable(), OutputFormat::Json, false, false);
        let value: serde_json::Value = serde_json::from_str(&formatted).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"]["code"], "SERVICE_UNAVAILABLE");
        assert_eq!(value["error"]["retryable"], true);
    }

    #[test]
    fn test_other_errors_use_display() {
        let error = Error::FileNotFound {
            path: PathBuf::from("missing.txt"),
        };
        assert_eq!(
            format_error(&error, OutputFormat::Json, false, false),
            "Error: File not found: missing.txt"
        );
    }
}
