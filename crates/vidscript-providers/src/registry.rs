//! Provider registry
//!
//! Turns declarative [`ProvidersConfig`] into constructed adapters, once, at
//! startup. Each capability gets an ordered list of strategies; the registry
//! then hands them to a [`FallbackStrategyManager`].

use crate::http::{build_client, HttpEndpoint};
use crate::resolve::{DirectUrl, HttpResolver, LocalParser};
use crate::script::{HttpScriptGenerator, SimpleScriptParser};
use crate::transcribe::{requires_video_url, HttpTranscriber, MockTranscriber};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};
use vidscript_core::{
    Capability, Error, FallbackConfig, FallbackStrategyManager, ResolveRequest, ResolvedVideo,
    Result, Script, ScriptRequest, StrategyDescriptor, TranscribeRequest, Transcript,
};

/// Adapter implementation selected by a strategy entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    LocalParser,
    DirectUrl,
    HttpResolver,
    MockTranscriber,
    HttpTranscriber,
    SimpleParser,
    HttpGenerator,
}

impl StrategyKind {
    /// Capability this kind of adapter serves
    pub fn capability(self) -> Capability {
        match self {
            StrategyKind::LocalParser | StrategyKind::DirectUrl | StrategyKind::HttpResolver => {
                Capability::ResolveVideo
            }
            StrategyKind::MockTranscriber | StrategyKind::HttpTranscriber => Capability::Transcribe,
            StrategyKind::SimpleParser | StrategyKind::HttpGenerator => Capability::GenerateScript,
        }
    }

    pub fn is_http(self) -> bool {
        matches!(
            self,
            StrategyKind::HttpResolver | StrategyKind::HttpTranscriber | StrategyKind::HttpGenerator
        )
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::LocalParser => "local-parser",
            StrategyKind::DirectUrl => "direct-url",
            StrategyKind::HttpResolver => "http-resolver",
            StrategyKind::MockTranscriber => "mock-transcriber",
            StrategyKind::HttpTranscriber => "http-transcriber",
            StrategyKind::SimpleParser => "simple-parser",
            StrategyKind::HttpGenerator => "http-generator",
        };
        f.write_str(name)
    }
}

fn default_enabled() -> bool {
    true
}

fn is_true(value: &bool) -> bool {
    *value
}

/// One strategy entry of a capability chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Provider identity used for health tracking
    pub name: String,
    pub kind: StrategyKind,
    /// Lower is tried first
    pub priority: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Name of the environment variable holding the API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Only attempt requests that carry a video URL
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub requires_video_url: bool,
    #[serde(default = "default_enabled", skip_serializing_if = "is_true")]
    pub enabled: bool,
}

impl StrategyConfig {
    pub fn new(name: impl Into<String>, kind: StrategyKind, priority: i64) -> Self {
        Self {
            name: name.into(),
            kind,
            priority,
            endpoint: None,
            api_key_env: None,
            timeout_ms: None,
            requires_video_url: false,
            enabled: true,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_api_key_env(mut self, var: impl Into<String>) -> Self {
        self.api_key_env = Some(var.into());
        self
    }
}

/// Strategy chains per capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub resolve_video: Vec<StrategyConfig>,
    pub transcribe: Vec<StrategyConfig>,
    pub generate_script: Vec<StrategyConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            resolve_video: vec![
                StrategyConfig::new("LocalParser", StrategyKind::LocalParser, 3),
                StrategyConfig::new("DirectUrl", StrategyKind::DirectUrl, 4),
            ],
            transcribe: vec![StrategyConfig::new(
                "MockTranscription",
                StrategyKind::MockTranscriber,
                999,
            )],
            generate_script: vec![StrategyConfig::new(
                "SimpleParser",
                StrategyKind::SimpleParser,
                3,
            )],
        }
    }
}

impl ProvidersConfig {
    /// Entries configured for a capability
    pub fn chain(&self, capability: Capability) -> &[StrategyConfig] {
        match capability {
            Capability::ResolveVideo => &self.resolve_video,
            Capability::Transcribe => &self.transcribe,
            Capability::GenerateScript => &self.generate_script,
        }
    }

    /// Check kinds, names and endpoints without building anything
    pub fn validate(&self) -> Result<()> {
        for capability in Capability::ALL {
            let mut seen = std::collections::HashSet::new();
            for entry in self.chain(capability) {
                if entry.name.trim().is_empty() {
                    return Err(Error::configuration(format!(
                        "A {} strategy has an empty name",
                        capability
                    )));
                }
                if !seen.insert(entry.name.as_str()) {
                    return Err(Error::configuration(format!(
                        "Duplicate {} strategy '{}'",
                        capability, entry.name
                    )));
                }
                if entry.kind.capability() != capability {
                    return Err(Error::configuration(format!(
                        "Strategy '{}' of kind {} cannot serve {}",
                        entry.name, entry.kind, capability
                    )));
                }
                if entry.kind.is_http() && entry.endpoint.is_none() {
                    return Err(Error::configuration(format!(
                        "Strategy '{}' of kind {} needs an endpoint",
                        entry.name, entry.kind
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Constructed adapters, ready to be registered
pub struct ProviderRegistry {
    resolvers: Vec<StrategyDescriptor<ResolveRequest, ResolvedVideo>>,
    transcribers: Vec<StrategyDescriptor<TranscribeRequest, Transcript>>,
    generators: Vec<StrategyDescriptor<ScriptRequest, Script>>,
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("resolvers", &self.resolvers)
            .field("transcribers", &self.transcribers)
            .field("generators", &self.generators)
            .finish()
    }
}

impl ProviderRegistry {
    /// Build every enabled adapter named in `config`
    pub fn from_config(config: &ProvidersConfig) -> Result<Self> {
        config.validate()?;
        let client = build_client()?;

        let mut registry = Self {
            resolvers: Vec::new(),
            transcribers: Vec::new(),
            generators: Vec::new(),
        };

        for entry in config.resolve_video.iter().filter(|entry| entry.enabled) {
            let descriptor = match entry.kind {
                StrategyKind::LocalParser => StrategyDescriptor::new(LocalParser::new(&entry.name), entry.priority),
                StrategyKind::DirectUrl => StrategyDescriptor::new(DirectUrl::new(&entry.name), entry.priority),
                _ => StrategyDescriptor::new(
                    HttpResolver::new(&entry.name, endpoint(&client, entry)?),
                    entry.priority,
                ),
            };
            registry.resolvers.push(descriptor);
        }

        for entry in config.transcribe.iter().filter(|entry| entry.enabled) {
            let descriptor = match entry.kind {
                StrategyKind::MockTranscriber => {
                    StrategyDescriptor::new(MockTranscriber::new(&entry.name), entry.priority)
                }
                _ => StrategyDescriptor::new(
                    HttpTranscriber::new(&entry.name, endpoint(&client, entry)?),
                    entry.priority,
                ),
            };
            let descriptor = if entry.requires_video_url {
                descriptor.with_condition(requires_video_url)
            } else {
                descriptor
            };
            registry.transcribers.push(descriptor);
        }

        for entry in config.generate_script.iter().filter(|entry| entry.enabled) {
            let descriptor = match entry.kind {
                StrategyKind::SimpleParser => {
                    StrategyDescriptor::new(SimpleScriptParser::new(&entry.name), entry.priority)
                }
                _ => StrategyDescriptor::new(
                    HttpScriptGenerator::new(&entry.name, endpoint(&client, entry)?),
                    entry.priority,
                ),
            };
            registry.generators.push(descriptor);
        }

        debug!(
            resolvers = registry.resolvers.len(),
            transcribers = registry.transcribers.len(),
            generators = registry.generators.len(),
            "Provider registry built"
        );
        Ok(registry)
    }

    /// Register every adapter with a fresh manager
    pub fn into_manager(self, config: FallbackConfig) -> Result<FallbackStrategyManager> {
        config.validate()?;
        let mut manager = FallbackStrategyManager::new(config);
        for strategy in self.resolvers {
            manager.register(strategy);
        }
        for strategy in self.transcribers {
            manager.register(strategy);
        }
        for strategy in self.generators {
            manager.register(strategy);
        }
        Ok(manager)
    }

    /// Provider names per capability in declaration order
    pub fn names(&self, capability: Capability) -> Vec<&str> {
        match capability {
            Capability::ResolveVideo => self.resolvers.iter().map(|s| s.name()).collect(),
            Capability::Transcribe => self.transcribers.iter().map(|s| s.name()).collect(),
            Capability::GenerateScript => self.generators.iter().map(|s| s.name()).collect(),
        }
    }
}

/// Build a manager straight from configuration
pub fn build_manager(providers: &ProvidersConfig, fallback: FallbackConfig) -> Result<FallbackStrategyManager> {
    ProviderRegistry::from_config(providers)?.into_manager(fallback)
}

fn endpoint(client: &Client, entry: &StrategyConfig) -> Result<HttpEndpoint> {
    let url = entry.endpoint.as_deref().ok_or_else(|| {
        Error::configuration(format!("Strategy '{}' needs an endpoint", entry.name))
    })?;

    let api_key = entry.api_key_env.as_deref().and_then(|var| match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Some(key),
        _ => {
            warn!(provider = %entry.name, env = var, "API key environment variable is not set");
            None
        }
    });

    let mut endpoint = HttpEndpoint::new(entry.name.as_str(), client.clone(), url)?.with_api_key(api_key);
    if let Some(timeout_ms) = entry.timeout_ms {
        endpoint = endpoint.with_timeout(Duration::from_millis(timeout_ms));
    }
    Ok(endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_chains() {
        let registry = ProviderRegistry::from_config(&ProvidersConfig::default()).unwrap();
        assert_eq!(registry.names(Capability::ResolveVideo), ["LocalParser", "DirectUrl"]);
        assert_eq!(registry.names(Capability::Transcribe), ["MockTranscription"]);
        assert_eq!(registry.names(Capability::GenerateScript), ["SimpleParser"]);

        let manager = registry.into_manager(FallbackConfig::default()).unwrap();
        let transcribe = manager.strategies(Capability::Transcribe);
        assert_eq!(transcribe[0].priority, 999);
    }

    #[test]
    fn test_kind_must_match_capability() {
        let config = ProvidersConfig {
            transcribe: vec![StrategyConfig::new("Oops", StrategyKind::SimpleParser, 1)],
            ..ProvidersConfig::default()
        };
        assert_eq!(config.validate().unwrap_err().code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_http_kinds_need_endpoint() {
        let config = ProvidersConfig {
            transcribe: vec![StrategyConfig::new("Yunmao", StrategyKind::HttpTranscriber, 1)],
            ..ProvidersConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let config = ProvidersConfig {
            resolve_video: vec![
                StrategyConfig::new("Same", StrategyKind::LocalParser, 1),
                StrategyConfig::new("Same", StrategyKind::DirectUrl, 2),
            ],
            ..ProvidersConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_disabled_entries_are_skipped() {
        let mut disabled = StrategyConfig::new("DirectUrl", StrategyKind::DirectUrl, 4);
        disabled.enabled = false;
        let config = ProvidersConfig {
            resolve_video: vec![
                StrategyConfig::new("LocalParser", StrategyKind::LocalParser, 3),
                disabled,
            ],
            ..ProvidersConfig::default()
        };
        let registry = ProviderRegistry::from_config(&config).unwrap();
        assert_eq!(registry.names(Capability::ResolveVideo), ["LocalParser"]);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: ProvidersConfig = serde_json::from_value(serde_json::json!({
            "transcribe": [
                {
                    "name": "Yunmao",
                    "kind": "http-transcriber",
                    "priority": 1,
                    "endpoint": "https://asr.example.com/v1/transcribe",
                    "api_key_env": "YUNMAO_API_KEY",
                    "requires_video_url": true
                },
                { "name": "MockTranscription", "kind": "mock-transcriber", "priority": 999 }
            ]
        }))
        .unwrap();

        assert_eq!(config.resolve_video, ProvidersConfig::default().resolve_video);
        assert!(config.transcribe[0].requires_video_url);
        assert!(config.transcribe[1].enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_invalid_fallback_config() {
        let registry = ProviderRegistry::from_config(&ProvidersConfig::default()).unwrap();
        assert!(registry
            .into_manager(FallbackConfig::default().with_max_failures(0))
            .is_err());
    }
}
