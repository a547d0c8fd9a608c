//! Core data types shared by the engine and provider adapters

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// A logical operation that several interchangeable providers can fulfil
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Turn a share link into a playable video URL
    ResolveVideo,
    /// Speech-to-text over a video URL or local audio file
    Transcribe,
    /// Turn a transcript into a structured video script
    GenerateScript,
}

impl Capability {
    pub const ALL: [Capability; 3] = [
        Capability::ResolveVideo,
        Capability::Transcribe,
        Capability::GenerateScript,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::ResolveVideo => "resolve-video",
            Capability::Transcribe => "transcribe",
            Capability::GenerateScript => "generate-script",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Capability::ALL
            .into_iter()
            .find(|capability| capability.as_str() == s)
            .ok_or_else(|| {
                Error::validation(
                    format!("Unknown capability '{}'", s),
                    Some("capability"),
                    Some(s.into()),
                )
            })
    }
}

/// Health-map key: one entry per (capability, provider) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderKey {
    pub capability: Capability,
    pub provider: String,
}

impl ProviderKey {
    pub fn new(capability: Capability, provider: impl Into<String>) -> Self {
        Self {
            capability,
            provider: provider.into(),
        }
    }
}

impl fmt::Display for ProviderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.capability, self.provider)
    }
}

impl FromStr for ProviderKey {
    type Err = Error;

    /// Parses `capability:provider`, e.g. `transcribe:Yunmao`
    fn from_str(s: &str) -> Result<Self> {
        let (capability, provider) = s.split_once(':').ok_or_else(|| {
            Error::validation(
                format!("Provider key '{}' is not of the form capability:provider", s),
                Some("providerKey"),
                Some(s.into()),
            )
        })?;
        if provider.is_empty() {
            return Err(Error::validation(
                "Provider key has an empty provider name",
                Some("providerKey"),
                Some(s.into()),
            ));
        }
        Ok(Self::new(capability.parse()?, provider))
    }
}

// Report maps are keyed by ProviderKey; serialise keys as `capability:provider`.
impl Serialize for ProviderKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Input of the resolve-video capability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveRequest {
    pub url: String,
}

impl ResolveRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Output of the resolve-video capability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedVideo {
    pub url: String,
}

/// Input of the transcribe capability
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscribeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_path: Option<PathBuf>,
}

impl TranscribeRequest {
    pub fn from_video_url(url: impl Into<String>) -> Self {
        Self {
            video_url: Some(url.into()),
            audio_path: None,
        }
    }

    pub fn from_audio_path(path: impl Into<PathBuf>) -> Self {
        Self {
            video_url: None,
            audio_path: Some(path.into()),
        }
    }

    /// The audio source a provider should read: local file first, then the video URL
    pub fn source(&self) -> Option<String> {
        self.audio_path
            .as_ref()
            .map(|path| path.display().to_string())
            .or_else(|| self.video_url.clone())
    }
}

/// Output of the transcribe capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    /// Provider-reported or provider-assumed confidence in [0, 1]
    pub confidence: f64,
}

/// Input of the generate-script capability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptRequest {
    pub text: String,
    pub template: String,
}

impl ScriptRequest {
    pub fn new(text: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            template: template.into(),
        }
    }
}

/// Structured video script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub title: String,
    /// Total duration in seconds
    pub duration: u32,
    pub scenes: Vec<Scene>,
}

/// One scene of a [`Script`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub scene_number: u32,
    /// `MM:SS-MM:SS`
    pub timestamp: String,
    pub description: String,
    pub dialogue: String,
    pub notes: String,
}

impl Script {
    /// Last-resort script: the whole text as one sixty-second scene
    pub fn basic(text: &str) -> Self {
        Self {
            title: "Basic script".to_string(),
            duration: 60,
            scenes: vec![Scene {
                scene_number: 1,
                timestamp: "00:00-01:00".to_string(),
                description: "Full content".to_string(),
                dialogue: text.to_string(),
                notes: "Degraded generation".to_string(),
            }],
        }
    }
}
