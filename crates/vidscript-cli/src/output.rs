//! Output formatting and writing utilities
//!
//! This module provides utilities for formatting and writing output
//! in various formats (JSON, YAML, human-readable) with specialised
//! human renderings for fallback outcomes, scripts, and the provider
//! health report.

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::logging::redaction;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use is_terminal::IsTerminal;
use serde::Serialize;
use std::io::{self, Write};
use std::time::Duration;
use tracing::{debug, trace};
use vidscript_core::{
    FallbackAttempt, FallbackOutcome, ResolvedVideo, Script, ServiceReport, Transcript,
};

/// Trait for formatting output with specialized support for common types
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format a resolved video with the providers that were tried
    fn format_video(&self, outcome: &FallbackOutcome<ResolvedVideo>) -> Result<String>;

    /// Format a transcript
    fn format_transcript(&self, outcome: &FallbackOutcome<Transcript>) -> Result<String>;

    /// Format a generated script scene by scene
    fn format_script(&self, outcome: &FallbackOutcome<Script>) -> Result<String>;

    /// Format the provider health report
    fn format_report(&self, report: &ServiceReport) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
            OutputFormat::Human => Ok(serde_json::to_string_pretty(value)?),
        }
    }

    fn format_video(&self, outcome: &FallbackOutcome<ResolvedVideo>) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_video_human(outcome)),
            _ => self.format(outcome),
        }
    }

    fn format_transcript(&self, outcome: &FallbackOutcome<Transcript>) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_transcript_human(outcome)),
            _ => self.format(outcome),
        }
    }

    fn format_script(&self, outcome: &FallbackOutcome<Script>) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_script_human(outcome)),
            _ => self.format(outcome),
        }
    }

    fn format_report(&self, report: &ServiceReport) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_report_human(report)),
            _ => self.format(report),
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    show_progress: bool,
    quiet: bool,
    verbose: u8,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool, verbose: u8) -> Self {
        Self {
            format,
            use_color,
            show_progress: !quiet && format == OutputFormat::Human && io::stderr().is_terminal(),
            quiet,
            verbose,
            writer: Box::new(io::stdout()),
        }
    }

    /// Create an output writer with a custom writer
    pub fn with_writer(
        format: OutputFormat,
        use_color: bool,
        quiet: bool,
        verbose: u8,
        writer: Box<dyn Write>,
    ) -> Self {
        Self {
            format,
            use_color,
            show_progress: false, // No progress bars with custom writers
            quiet,
            verbose,
            writer,
        }
    }

    /// Turn progress spinners off regardless of the terminal
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Get the output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Check if verbose output should be shown
    pub fn is_verbose(&self) -> bool {
        self.verbose > 0
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        debug!("Output info: {}", message);

        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a warning message
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.yellow().to_string())
        } else {
            self.writeln(&format!("WARNING: {}", message))
        }
    }

    /// Write a section header
    pub fn section(&mut self, title: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        self.writeln("")?;
        if self.use_color {
            self.writeln(&format!("═══ {} ═══", title).bright_blue().to_string())
        } else {
            self.writeln(&format!("=== {} ===", title))
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let mut value_json = serde_json::to_value(value)?;
        redaction::redact_json_value(&mut value_json);

        trace!(
            "Outputting data: {}",
            serde_json::to_string(&value_json).unwrap_or_else(|_| "[failed to serialize]".to_string())
        );

        let formatted = self.format.format(value)?;
        self.writeln(formatted.trim_end())
    }

    /// Write a resolved video
    pub fn video(&mut self, outcome: &FallbackOutcome<ResolvedVideo>) -> Result<()> {
        let formatted = self.format.format_video(outcome)?;
        self.writeln(formatted.trim_end())
    }

    /// Write a transcript
    pub fn transcript(&mut self, outcome: &FallbackOutcome<Transcript>) -> Result<()> {
        let formatted = self.format.format_transcript(outcome)?;
        self.writeln(formatted.trim_end())
    }

    /// Write a script
    pub fn script(&mut self, outcome: &FallbackOutcome<Script>) -> Result<()> {
        let formatted = self.format.format_script(outcome)?;
        self.writeln(formatted.trim_end())
    }

    /// Write the provider health report
    pub fn report(&mut self, report: &ServiceReport) -> Result<()> {
        let formatted = self.format.format_report(report)?;
        self.writeln(formatted.trim_end())
    }

    /// Write the attempts of a fallback run when verbose or when it fell back
    pub fn attempts(&mut self, attempts: &[FallbackAttempt]) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }
        if attempts.len() > 1 || self.is_verbose() {
            let formatted = format_attempts_human(attempts);
            self.writeln(formatted.trim_end())?;
        }
        Ok(())
    }

    /// Create a spinner for indeterminate progress
    pub fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(default_spinner_style());
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }

    /// Write a table (for human format)
    pub fn table(&mut self, headers: &[&str], rows: Vec<Vec<String>>) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }

        let table = render_table(headers, &rows);
        let mut lines = table.lines();
        if let Some(header) = lines.next() {
            if self.use_color {
                self.writeln(&header.bold().to_string())?;
            } else {
                self.writeln(header)?;
            }
        }
        for line in lines {
            self.writeln(line)?;
        }
        Ok(())
    }
}

/// Helper function to create a spinner style
pub fn default_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Align `rows` under `headers`, columns separated by `│`
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let render_row = |cells: Vec<&str>| {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| match widths.get(i) {
                Some(width) => format!("{:width$}", cell, width = *width),
                None => cell.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" │ ")
            .trim_end()
            .to_string()
    };

    let mut output = render_row(headers.to_vec());
    output.push('\n');
    output.push_str(
        &widths
            .iter()
            .map(|w| "─".repeat(*w))
            .collect::<Vec<_>>()
            .join("─┼─"),
    );
    output.push('\n');
    for row in rows {
        output.push_str(&render_row(row.iter().map(String::as_str).collect()));
        output.push('\n');
    }
    output
}

/// Format the providers tried during one fallback run
fn format_attempts_human(attempts: &[FallbackAttempt]) -> String {
    let mut output = String::from("🔁 Attempts:\n");

    for attempt in attempts {
        if attempt.success {
            output.push_str(&format!("  ✓ {} ({}ms)\n", attempt.provider, attempt.duration_ms));
        } else {
            let retry = match attempt.retryable {
                Some(true) => ", retryable",
                _ => "",
            };
            output.push_str(&format!(
                "  ✗ {} ({}ms) {}{}\n",
                attempt.provider,
                attempt.duration_ms,
                attempt.code.as_deref().unwrap_or("UNKNOWN_ERROR"),
                retry
            ));
            if let Some(error) = &attempt.error {
                output.push_str(&format!("      {}\n", redaction::redact_sensitive(error)));
            }
        }
    }

    output
}

/// Format a resolved video for human reading
fn format_video_human(outcome: &FallbackOutcome<ResolvedVideo>) -> String {
    let mut output = String::new();
    output.push_str(&format!("🎬 Video URL: {}\n", outcome.value.url));
    output.push_str(&format!("🔧 Provider: {}\n", outcome.provider_used));
    output
}

/// Format a transcript for human reading
fn format_transcript_human(outcome: &FallbackOutcome<Transcript>) -> String {
    let mut output = String::new();
    output.push_str(&format!("🔧 Provider: {}\n", outcome.provider_used));
    output.push_str(&format!(
        "📊 Confidence: {:.0}%\n\n",
        outcome.value.confidence * 100.0
    ));
    output.push_str("📝 Transcript:\n");
    output.push_str(&outcome.value.text);
    output.push('\n');
    output
}

/// Format a script for human reading
fn format_script_human(outcome: &FallbackOutcome<Script>) -> String {
    let script = &outcome.value;
    let mut output = String::new();

    output.push_str(&format!("═══ {} ═══\n\n", script.title));
    output.push_str(&format!("🔧 Provider: {}\n", outcome.provider_used));
    output.push_str(&format!(
        "⏱️  Duration: {}s in {} scene(s)\n\n",
        script.duration,
        script.scenes.len()
    ));

    for scene in &script.scenes {
        output.push_str(&format!(
            "🎞️  Scene {} [{}] {}\n",
            scene.scene_number, scene.timestamp, scene.description
        ));
        output.push_str(&format!("  💬 {}\n", scene.dialogue));
        if !scene.notes.is_empty() {
            output.push_str(&format!("  🗒️  {}\n", scene.notes));
        }
        output.push('\n');
    }

    output
}

/// Format the provider health report for human reading
fn format_report_human(report: &ServiceReport) -> String {
    if report.is_empty() {
        return "No provider has been used yet\n".to_string();
    }

    let rows = report
        .iter()
        .map(|(key, status)| {
            vec![
                key.to_string(),
                if status.available { "✅ up" } else { "❌ down" }.to_string(),
                status.failure_count.to_string(),
                format!("{:.3}", status.error_rate),
                status
                    .last_failure_time
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect::<Vec<_>>();

    render_table(
        &["Provider", "Status", "Failures", "Error rate", "Last failure"],
        &rows,
    )
}
