//! generate-script adapters

use crate::http::HttpEndpoint;
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use std::sync::OnceLock;
use tracing::info;
use vidscript_core::{Error, Provider, Scene, Script, ScriptRequest};

/// Placeholder replaced by the transcript in prompt templates
pub const TRANSCRIPT_PLACEHOLDER: &str = "{{transcriptText}}";

const SENTENCES_PER_SCENE: usize = 3;
const SECONDS_PER_SCENE: u32 = 30;
const SECONDS_PER_SENTENCE: usize = 10;

fn sentence_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"[^。！？.!?]+[。！？.!?]*").expect("sentence pattern is valid")
    })
}

/// Split text into sentences, keeping each terminator with its sentence
pub fn split_sentences(text: &str) -> Vec<&str> {
    sentence_pattern()
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|sentence| !sentence.trim_matches(|c| "。！？.!?".contains(c)).is_empty())
        .collect()
}

/// Rule-based script: three sentences per thirty-second scene
pub fn scenes_from_text(text: &str) -> Vec<Scene> {
    split_sentences(text)
        .chunks(SENTENCES_PER_SCENE)
        .enumerate()
        .map(|(index, sentences)| {
            let first = index * SENTENCES_PER_SCENE;
            Scene {
                scene_number: index as u32 + 1,
                timestamp: format!(
                    "00:{:02}-00:{:02}",
                    first * SECONDS_PER_SENTENCE,
                    (first + SENTENCES_PER_SCENE) * SECONDS_PER_SENTENCE
                ),
                description: format!("Scene {}", index + 1),
                dialogue: sentences.join(" "),
                notes: "Auto-generated".to_string(),
            }
        })
        .collect()
}

/// Last-resort one-scene script over the whole text
pub fn basic_script(text: &str) -> Script {
    Script::basic(text)
}

/// Offline generator splitting the transcript on sentence terminators
#[derive(Debug, Clone)]
pub struct SimpleScriptParser {
    name: String,
}

impl SimpleScriptParser {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for SimpleScriptParser {
    fn default() -> Self {
        Self::new("SimpleParser")
    }
}

#[async_trait]
impl Provider<ScriptRequest, Script> for SimpleScriptParser {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, input: &ScriptRequest) -> anyhow::Result<Script> {
        info!(provider = %self.name, "Using simple script parser");
        let scenes = scenes_from_text(&input.text);
        if scenes.is_empty() {
            return Err(Error::validation("Transcript has no sentences", Some("text"), None).into());
        }

        Ok(Script {
            title: "Auto-generated video script".to_string(),
            duration: scenes.len() as u32 * SECONDS_PER_SCENE,
            scenes,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GenerationBody {
    script: Option<Script>,
    text: Option<String>,
    output: Option<GenerationOutput>,
}

#[derive(Debug, Deserialize)]
struct GenerationOutput {
    text: Option<String>,
}

/// Generic text-generation service
///
/// Posts `{"prompt"}` built from the template and reads either a structured
/// `script`, or generated `text` (top level or under `output`). Generated text
/// is used as a JSON script when it parses as one and is split into scenes
/// otherwise.
#[derive(Debug, Clone)]
pub struct HttpScriptGenerator {
    name: String,
    endpoint: HttpEndpoint,
}

impl HttpScriptGenerator {
    pub fn new(name: impl Into<String>, endpoint: HttpEndpoint) -> Self {
        Self {
            name: name.into(),
            endpoint,
        }
    }

    /// Fill the template; templates without the placeholder get the text appended
    pub fn render_prompt(template: &str, text: &str) -> String {
        if template.contains(TRANSCRIPT_PLACEHOLDER) {
            template.replacen(TRANSCRIPT_PLACEHOLDER, text, 1)
        } else if template.trim().is_empty() {
            text.to_string()
        } else {
            format!("{}\n\n{}", template, text)
        }
    }
}

#[async_trait]
impl Provider<ScriptRequest, Script> for HttpScriptGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, input: &ScriptRequest) -> anyhow::Result<Script> {
        let prompt = Self::render_prompt(&input.template, &input.text);
        let body: GenerationBody = self.endpoint.post_json(&json!({ "prompt": prompt })).await?;

        if let Some(script) = body.script {
            return Ok(script);
        }

        let generated = body
            .text
            .or_else(|| body.output.and_then(|output| output.text))
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| {
                Error::parse("generated script", Some("response has no script or text"))
                    .with_context("service", self.endpoint.service())
            })?;

        if let Ok(script) = serde_json::from_str::<Script>(generated.trim()) {
            return Ok(script);
        }

        let scenes = scenes_from_text(&generated);
        if scenes.is_empty() {
            return Err(Error::parse("generated script", Some("generated text has no sentences"))
                .with_context("service", self.endpoint.service())
                .into());
        }

        Ok(Script {
            title: "Generated video script".to_string(),
            duration: scenes.len() as u32 * SECONDS_PER_SCENE,
            scenes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sentences_mixed_terminators() {
        let sentences = split_sentences("第一句。第二句！Third one? Fourth.  ");
        assert_eq!(sentences, ["第一句。", "第二句！", "Third one?", "Fourth."]);
        assert!(split_sentences("。。！").is_empty());
        assert_eq!(split_sentences("no terminator"), ["no terminator"]);
    }

    #[test]
    fn test_scene_layout() {
        let scenes = scenes_from_text("A. B. C. D. E.");
        assert_eq!(scenes.len(), 2);
        assert_eq!(scenes[0].scene_number, 1);
        assert_eq!(scenes[0].timestamp, "00:00-00:30");
        assert_eq!(scenes[0].dialogue, "A. B. C.");
        assert_eq!(scenes[1].timestamp, "00:30-00:60");
        assert_eq!(scenes[1].dialogue, "D. E.");
    }

    #[tokio::test]
    async fn test_simple_parser_duration() {
        let script = SimpleScriptParser::default()
            .invoke(&ScriptRequest::new("一。二。三。四。", "default"))
            .await
            .unwrap();
        assert_eq!(script.scenes.len(), 2);
        assert_eq!(script.duration, 60);
    }

    #[tokio::test]
    async fn test_simple_parser_rejects_empty_text() {
        let err = SimpleScriptParser::default()
            .invoke(&ScriptRequest::new("  ", "default"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("VALIDATION_ERROR"));
    }

    #[test]
    fn test_render_prompt() {
        assert_eq!(
            HttpScriptGenerator::render_prompt("Rewrite: {{transcriptText}}", "hello"),
            "Rewrite: hello"
        );
        assert_eq!(HttpScriptGenerator::render_prompt("Rewrite", "hello"), "Rewrite\n\nhello");
        assert_eq!(HttpScriptGenerator::render_prompt("", "hello"), "hello");
    }

    #[test]
    fn test_basic_script() {
        let script = basic_script("whole text");
        assert_eq!(script.scenes.len(), 1);
        assert_eq!(script.scenes[0].timestamp, "00:00-01:00");
    }
}
