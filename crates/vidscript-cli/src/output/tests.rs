// Tests for output formatting
//
// Human renderings of fallback outcomes, scripts and the health report,
// plus the machine formats written through OutputWriter.

use super::*;
use std::sync::{Arc, Mutex};
use vidscript_core::{Capability, Error, ProviderHealthTracker, ProviderKey, Scene};

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn writer(format: OutputFormat, verbose: u8) -> (OutputWriter, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let writer = OutputWriter::with_writer(format, false, false, verbose, Box::new(buffer.clone()));
    (writer, buffer)
}

fn fell_back_video() -> FallbackOutcome<ResolvedVideo> {
    FallbackOutcome {
        value: ResolvedVideo {
            url: "https://www.example.com/v/1".to_string(),
        },
        provider_used: "DirectUrl".to_string(),
        attempts: vec![
            FallbackAttempt {
                provider: "LocalParser".to_string(),
                success: false,
                code: Some("PARSE_ERROR".to_string()),
                retryable: Some(false),
                error: Some("PARSE_ERROR: not a short link api_key=sk-1234567890abcdef".to_string()),
                duration_ms: 1,
            },
            FallbackAttempt {
                provider: "DirectUrl".to_string(),
                success: true,
                code: None,
                retryable: None,
                error: None,
                duration_ms: 0,
            },
        ],
    }
}

fn two_scene_script() -> FallbackOutcome<Script> {
    FallbackOutcome {
        value: Script {
            title: "Auto-generated video script".to_string(),
            duration: 60,
            scenes: vec![
                Scene {
                    scene_number: 1,
                    timestamp: "00:00-00:30".to_string(),
                    description: "Scene 1".to_string(),
                    dialogue: "A. B. C.".to_string(),
                    notes: "Auto-generated".to_string(),
                },
                Scene {
                    scene_number: 2,
                    timestamp: "00:30-00:60".to_string(),
                    description: "Scene 2".to_string(),
                    dialogue: "D.".to_string(),
                    notes: String::new(),
                },
            ],
        },
        provider_used: "SimpleParser".to_string(),
        attempts: Vec::new(),
    }
}

#[test]
fn test_video_human_and_attempts() {
    let (mut output, buffer) = writer(OutputFormat::Human, 0);
    let outcome = fell_back_video();

    output.video(&outcome).unwrap();
    output.attempts(&outcome.attempts).unwrap();

    let text = buffer.contents();
    assert!(text.contains("🎬 Video URL: https://www.example.com/v/1"));
    assert!(text.contains("🔧 Provider: DirectUrl"));
    assert!(text.contains("✗ LocalParser (1ms) PARSE_ERROR"));
    assert!(text.contains("✓ DirectUrl (0ms)"));
    assert!(!text.contains("sk-1234567890abcdef"));
}

#[test]
fn test_single_attempt_hidden_unless_verbose() {
    let attempts = vec![FallbackAttempt {
        provider: "DirectUrl".to_string(),
        success: true,
        code: None,
        retryable: None,
        error: None,
        duration_ms: 2,
    }];

    let (mut quiet, buffer) = writer(OutputFormat::Human, 0);
    quiet.attempts(&attempts).unwrap();
    assert!(buffer.contents().is_empty());

    let (mut verbose, buffer) = writer(OutputFormat::Human, 1);
    verbose.attempts(&attempts).unwrap();
    assert!(buffer.contents().contains("🔁 Attempts:"));
}

#[test]
fn test_video_json_shape() {
    let (mut output, buffer) = writer(OutputFormat::Json, 0);
    output.video(&fell_back_video()).unwrap();
    output.attempts(&fell_back_video().attempts).unwrap();

    let value: serde_json::Value = serde_json::from_str(buffer.contents().trim()).unwrap();
    assert_eq!(value["url"], "https://www.example.com/v/1");
    assert_eq!(value["providerUsed"], "DirectUrl");
    assert_eq!(value["attempts"][0]["code"], "PARSE_ERROR");
    assert_eq!(value["attempts"][1]["durationMs"], 0);
}

#[test]
fn test_script_human() {
    let formatted = format_script_human(&two_scene_script());

    assert!(formatted.contains("═══ Auto-generated video script ═══"));
    assert!(formatted.contains("Duration: 60s in 2 scene(s)"));
    assert!(formatted.contains("Scene 1 [00:00-00:30] Scene 1"));
    assert!(formatted.contains("💬 A. B. C."));
    assert_eq!(formatted.matches("🗒️").count(), 1);
}

#[test]
fn test_script_yaml() {
    let formatted = OutputFormat::Yaml.format_script(&two_scene_script()).unwrap();
    let value: serde_yaml::Value = serde_yaml::from_str(&formatted).unwrap();
    assert_eq!(value["providerUsed"].as_str(), Some("SimpleParser"));
    assert_eq!(value["scenes"][1]["timestamp"].as_str(), Some("00:30-00:60"));
}

#[test]
fn test_transcript_human() {
    let outcome = FallbackOutcome {
        value: Transcript {
            text: "hello world".to_string(),
            confidence: 0.1,
        },
        provider_used: "MockTranscription".to_string(),
        attempts: Vec::new(),
    };

    let formatted = format_transcript_human(&outcome);
    assert!(formatted.contains("Confidence: 10%"));
    assert!(formatted.ends_with("hello world\n"));
}

#[test]
fn test_report_human_and_json() {
    let tracker = ProviderHealthTracker::default();
    let yunmao = ProviderKey::new(Capability::Transcribe, "Yunmao");
    let mock = ProviderKey::new(Capability::Transcribe, "MockTranscription");
    tracker.record_success(&mock);
    let failure = Error::service_unavailable("Yunmao", None);
    tracker.record_failure(&yunmao, &failure);

    let report = tracker.report();

    let human = format_report_human(&report);
    let lines: Vec<&str> = human.lines().collect();
    assert!(lines[0].starts_with("Provider"));
    assert!(lines[2].starts_with("transcribe:MockTranscription"));
    assert!(lines[3].starts_with("transcribe:Yunmao"));
    assert!(lines[3].contains("0.100"));

    let json = OutputFormat::Json.format_report(&report).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["transcribe:Yunmao"]["failureCount"], 1);
    assert_eq!(value["transcribe:MockTranscription"]["available"], true);
}

#[test]
fn test_empty_report() {
    let report = ServiceReport::new();
    assert_eq!(format_report_human(&report), "No provider has been used yet\n");
    assert_eq!(OutputFormat::Json.format_report(&report).unwrap(), "{}");
}

#[test]
fn test_render_table_alignment() {
    let table = render_table(
        &["Name", "Priority"],
        &[
            vec!["LocalParser".to_string(), "3".to_string()],
            vec!["DirectUrl".to_string(), "4".to_string()],
        ],
    );
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines[0], "Name        │ Priority");
    assert_eq!(lines[2], "LocalParser │ 3");
    assert_eq!(lines[3], "DirectUrl   │ 4");
}

#[test]
fn test_human_messages_suppressed_for_machine_formats() {
    let (mut output, buffer) = writer(OutputFormat::Json, 0);
    output.info("resolving").unwrap();
    output.success("done").unwrap();
    output.warning("careful").unwrap();
    output.section("Result").unwrap();
    output.table(&["A"], vec![vec!["1".to_string()]]).unwrap();
    assert!(buffer.contents().is_empty());

    let (mut output, buffer) = writer(OutputFormat::Human, 0);
    output.info("resolving").unwrap();
    output.section("Result").unwrap();
    assert_eq!(buffer.contents(), "INFO: resolving\n\n=== Result ===\n");
}
