//! transcribe adapters

use crate::http::HttpEndpoint;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::io;
use tracing::{debug, warn};
use vidscript_core::{Error, Provider, TranscribeRequest, Transcript};

/// Confidence reported by the mock transcriber
pub const MOCK_CONFIDENCE: f64 = 0.1;

const MOCK_TEXT: &str = "This is a transcript of a test video. The video contains all kinds of interesting moments...";

/// Strategy condition for providers that can only fetch remote media
pub fn requires_video_url(request: &TranscribeRequest) -> bool {
    request.video_url.as_deref().is_some_and(|url| !url.trim().is_empty())
}

/// Canned transcript for development and as the final fallback
#[derive(Debug, Clone)]
pub struct MockTranscriber {
    name: String,
}

impl MockTranscriber {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for MockTranscriber {
    fn default() -> Self {
        Self::new("MockTranscription")
    }
}

#[async_trait]
impl Provider<TranscribeRequest, Transcript> for MockTranscriber {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, _input: &TranscribeRequest) -> anyhow::Result<Transcript> {
        warn!(provider = %self.name, "Using mock transcription data");
        Ok(Transcript {
            text: MOCK_TEXT.to_string(),
            confidence: MOCK_CONFIDENCE,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptBody {
    text: Option<String>,
    confidence: Option<f64>,
    result: Option<TranscriptResult>,
}

#[derive(Debug, Deserialize)]
struct TranscriptResult {
    text: Option<String>,
}

/// Generic speech-to-text service
///
/// Local audio is uploaded as `application/octet-stream`; a video URL is sent
/// as `{"videoUrl": ...}`. The service answers `{"text", "confidence"?}` or
/// `{"result": {"text"}}`.
#[derive(Debug, Clone)]
pub struct HttpTranscriber {
    name: String,
    endpoint: HttpEndpoint,
    default_confidence: f64,
}

impl HttpTranscriber {
    pub fn new(name: impl Into<String>, endpoint: HttpEndpoint) -> Self {
        Self {
            name: name.into(),
            endpoint,
            default_confidence: 0.9,
        }
    }

    /// Confidence assumed when the service does not report one
    pub fn with_default_confidence(mut self, confidence: f64) -> Self {
        self.default_confidence = confidence.clamp(0.0, 1.0);
        self
    }

    async fn upload(&self, input: &TranscribeRequest) -> Result<TranscriptBody, Error> {
        if let Some(path) = &input.audio_path {
            let audio = tokio::fs::read(path).await.map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => Error::validation(
                    format!("Audio file not found: {}", path.display()),
                    Some("audioPath"),
                    Some(path.display().to_string().into()),
                ),
                _ => Error::system(format!("Failed to read audio file {}: {}", path.display(), e))
                    .with_cause(e),
            })?;
            debug!(provider = %self.name, bytes = audio.len(), "Uploading local audio");
            return self.endpoint.post_bytes(audio, "application/octet-stream").await;
        }

        match &input.video_url {
            Some(url) => self.endpoint.post_json(&json!({ "videoUrl": url })).await,
            None => Err(Error::validation(
                "Transcription needs a video URL or an audio file",
                Some("videoUrl"),
                None,
            )),
        }
    }
}

#[async_trait]
impl Provider<TranscribeRequest, Transcript> for HttpTranscriber {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, input: &TranscribeRequest) -> anyhow::Result<Transcript> {
        let body = self.upload(input).await?;

        let text = body
            .text
            .or_else(|| body.result.and_then(|result| result.text))
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                Error::transcription("provider returned an empty transcript")
                    .with_context("service", self.endpoint.service())
            })?;

        Ok(Transcript {
            text,
            confidence: body
                .confidence
                .unwrap_or(self.default_confidence)
                .clamp(0.0, 1.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_transcriber() {
        let transcript = MockTranscriber::default()
            .invoke(&TranscribeRequest::default())
            .await
            .unwrap();
        assert_eq!(transcript.confidence, MOCK_CONFIDENCE);
        assert!(!transcript.text.is_empty());
    }

    #[test]
    fn test_requires_video_url() {
        assert!(requires_video_url(&TranscribeRequest::from_video_url("https://v.example/1")));
        assert!(!requires_video_url(&TranscribeRequest::from_video_url("  ")));
        assert!(!requires_video_url(&TranscribeRequest::from_audio_path("/tmp/a.mp3")));
    }
}
