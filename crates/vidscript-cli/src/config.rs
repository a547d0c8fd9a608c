//! Configuration management for the CLI
//!
//! This module handles loading configuration from:
//! - Default values
//! - Configuration files (YAML/JSON/TOML)
//! - Environment variables (logging and provider API keys)

use crate::error::{Error, Result};
use crate::logging::LogFormat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use vidscript_core::FallbackConfig;
use vidscript_providers::{ProvidersConfig, StrategyConfig, StrategyKind};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Circuit-breaker settings shared by every chain
    pub fallback: FallbackSettings,

    /// Strategy chains per capability
    pub providers: ProvidersConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingSettings,
}

/// File form of [`FallbackConfig`], with durations in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackSettings {
    pub max_failures: u32,
    pub reset_timeout_ms: u64,
    pub error_rate_threshold: f64,
    pub check_interval_ms: u64,
    /// Upper bound on one fallback chain; unbounded when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_ms: Option<u64>,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Use colored output when the terminal supports it
    pub color: bool,

    /// Show progress spinners
    pub progress: bool,
}

/// Logging configuration from the file; environment variables still win
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Log format (compact, full, json)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<LogFormat>,

    /// Log file path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    /// Per-module level overrides
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub modules: BTreeMap<String, String>,
}

impl Default for FallbackSettings {
    fn default() -> Self {
        Self::from(&FallbackConfig::default())
    }
}

impl From<&FallbackConfig> for FallbackSettings {
    fn from(config: &FallbackConfig) -> Self {
        Self {
            max_failures: config.max_failures,
            reset_timeout_ms: config.reset_timeout.as_millis() as u64,
            error_rate_threshold: config.error_rate_threshold,
            check_interval_ms: config.check_interval.as_millis() as u64,
            deadline_ms: config.overall_deadline.map(|d| d.as_millis() as u64),
        }
    }
}

impl FallbackSettings {
    /// Convert into the engine configuration, validating it
    pub fn to_fallback_config(&self) -> Result<FallbackConfig> {
        let config = FallbackConfig {
            max_failures: self.max_failures,
            reset_timeout: Duration::from_millis(self.reset_timeout_ms),
            error_rate_threshold: self.error_rate_threshold,
            check_interval: Duration::from_millis(self.check_interval_ms),
            overall_deadline: self.deadline_ms.map(Duration::from_millis),
        };
        config
            .validate()
            .map_err(|e| Error::config(format!("fallback: {}", e.message())))?;
        Ok(config)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            color: true,
            progress: true,
        }
    }
}

/// Configuration file syntax, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Yaml,
    Json,
    Toml,
}

impl FileFormat {
    fn of(path: &Path) -> Result<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            _ => Err(Error::InvalidFormat {
                path: path.to_path_buf(),
                expected: "YAML, JSON or TOML".to_string(),
            }),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;

        let config = match FileFormat::of(path)? {
            FileFormat::Yaml => serde_yaml::from_str(&content)?,
            FileFormat::Json => serde_json::from_str(&content)?,
            FileFormat::Toml => toml::from_str(&content)?,
        };

        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        eprintln!("Warning: Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        let config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::load()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Get default configuration file paths to check
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".vidscript.yaml"),
            PathBuf::from(".vidscript.yml"),
            PathBuf::from(".vidscript.json"),
            PathBuf::from(".vidscript.toml"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            let vidscript_dir = config_dir.join("vidscript");
            paths.push(vidscript_dir.join("config.yaml"));
            paths.push(vidscript_dir.join("config.json"));
            paths.push(vidscript_dir.join("config.toml"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".vidscript.yaml"));
            paths.push(home_dir.join(".vidscript.json"));
            paths.push(home_dir.join(".vidscript.toml"));
        }

        paths
    }

    /// Check the fallback settings and provider chains
    pub fn validate(&self) -> Result<()> {
        self.fallback.to_fallback_config()?;
        self.providers
            .validate()
            .map_err(|e| Error::config(format!("providers: {}", e.message())))
    }

    /// Serialize in the format named by `path`'s extension
    pub fn render(&self, path: &Path) -> Result<String> {
        Ok(match FileFormat::of(path)? {
            FileFormat::Yaml => serde_yaml::to_string(self)?,
            FileFormat::Json => serde_json::to_string_pretty(self)?,
            FileFormat::Toml => toml::to_string_pretty(self)
                .map_err(|e| Error::config(format!("Failed to serialize as TOML: {}", e)))?,
        })
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.render(path)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Starting point written by `config init`
    ///
    /// The defaults plus a disabled HTTP transcriber showing how a remote
    /// provider is declared.
    pub fn sample() -> Self {
        let mut config = Self::default();
        let mut remote = StrategyConfig::new("Whisper", StrategyKind::HttpTranscriber, 1)
            .with_endpoint("https://api.example.com/v1/transcribe")
            .with_api_key_env("WHISPER_API_KEY");
        remote.timeout_ms = Some(30_000);
        remote.enabled = false;
        config.providers.transcribe.insert(0, remote);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use vidscript_core::Capability;

    fn write_config(extension: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(&format!(".{}", extension))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_match_engine() {
        let config = Config::default();
        let fallback = config.fallback.to_fallback_config().unwrap();
        assert_eq!(fallback, FallbackConfig::default());
        assert_eq!(config.providers, ProvidersConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_file() {
        let file = write_config(
            "yaml",
            r#"
fallback:
  max_failures: 5
  deadline_ms: 20000
providers:
  transcribe:
    - name: Yunmao
      kind: http-transcriber
      priority: 1
      endpoint: https://api.example.com/asr
      requires_video_url: true
    - name: MockTranscription
      kind: mock-transcriber
      priority: 999
logging:
  level: debug
  format: json
"#,
        );

        let config = Config::load_with_file(Some(file.path())).unwrap();
        assert_eq!(config.fallback.max_failures, 5);
        assert_eq!(config.fallback.reset_timeout_ms, 60_000);

        let fallback = config.fallback.to_fallback_config().unwrap();
        assert_eq!(fallback.overall_deadline, Some(Duration::from_secs(20)));

        let chain = config.providers.chain(Capability::Transcribe);
        assert_eq!(chain.len(), 2);
        assert!(chain[0].requires_video_url);
        assert_eq!(config.logging.format, Some(LogFormat::Json));
        // sections left out keep their defaults
        assert_eq!(config.providers.resolve_video.len(), 2);
    }

    #[test]
    fn test_toml_file() {
        let file = write_config(
            "toml",
            r#"
[fallback]
error_rate_threshold = 0.3

[output]
color = false
"#,
        );

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.fallback.error_rate_threshold, 0.3);
        assert!(!config.output.color);
        assert!(config.output.progress);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let file = write_config("json", r#"{"fallback": {"max_failures": 0}}"#);
        let err = Config::load_with_file(Some(file.path())).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let file = write_config(
            "json",
            r#"{"providers": {"transcribe": [{"name": "X", "kind": "simple-parser", "priority": 1}]}}"#,
        );
        let err = Config::load_with_file(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("cannot serve"));
    }

    #[test]
    fn test_unknown_extension_and_missing_file() {
        let file = write_config("ini", "x=1");
        assert!(matches!(
            Config::from_file(file.path()),
            Err(Error::InvalidFormat { .. })
        ));
        assert!(matches!(
            Config::from_file(Path::new("/nonexistent/vidscript.yaml")),
            Err(Error::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_sample_survives_every_format() {
        let dir = tempfile::tempdir().unwrap();
        let sample = Config::sample();
        assert!(sample.validate().is_ok());

        for name in ["config.yaml", "config.json", "config.toml"] {
            let path = dir.path().join(name);
            sample.save(&path).unwrap();
            assert_eq!(Config::from_file(&path).unwrap(), sample, "{}", name);
        }
    }
}
