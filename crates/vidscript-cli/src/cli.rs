//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API,
//! providing a type-safe and well-documented command interface.

use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use std::path::PathBuf;

/// Vidscript CLI - Turn short videos into scripts through provider fallback chains
///
/// Each capability (resolve-video, transcribe, generate-script) is served by an
/// ordered chain of providers. Failing or unhealthy providers are skipped and the
/// next one is tried.
#[derive(Parser, Debug)]
#[command(
    name = "vidscript",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "VIDSCRIPT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Print the provider health report after the command
    #[arg(long, global = true)]
    pub report: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a share link into a downloadable video URL
    Resolve(ResolveArgs),

    /// Transcribe a video URL or a local audio file
    Transcribe(TranscribeArgs),

    /// Generate a video script from transcript text
    Generate(GenerateArgs),

    /// Resolve, transcribe, and script a video in one go
    Pipeline(PipelineArgs),

    /// List the configured provider chains in dispatch order
    Providers,

    /// Manage configuration files
    Config(ConfigArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Arguments for the resolve command
#[derive(Parser, Debug, Clone)]
pub struct ResolveArgs {
    /// Share link or video page URL
    #[arg(value_name = "URL")]
    pub url: String,
}

/// Arguments for the transcribe command
#[derive(Parser, Debug, Clone)]
#[command(group(ArgGroup::new("source").required(true).multiple(true).args(["video_url", "audio_path"])))]
pub struct TranscribeArgs {
    /// Direct video URL to transcribe
    #[arg(long)]
    pub video_url: Option<String>,

    /// Local audio file to upload
    #[arg(long)]
    pub audio_path: Option<PathBuf>,
}

/// Arguments for the generate command
#[derive(Parser, Debug, Clone)]
#[command(group(ArgGroup::new("input").required(true).args(["text", "text_file"])))]
pub struct GenerateArgs {
    /// Transcript text
    #[arg(long)]
    pub text: Option<String>,

    /// File containing the transcript text
    #[arg(long, value_name = "FILE")]
    pub text_file: Option<PathBuf>,

    /// Prompt template; `{{transcriptText}}` is replaced by the transcript
    #[arg(long, default_value = "default")]
    pub template: String,

    /// Return a basic one-scene script instead of failing when every generator fails
    #[arg(long)]
    pub basic_fallback: bool,

    /// Save the generated script to a file
    #[arg(long = "save-to", value_name = "OUTPUT_FILE")]
    pub save_to: Option<PathBuf>,
}

/// Arguments for the pipeline command
#[derive(Parser, Debug, Clone)]
pub struct PipelineArgs {
    /// Share link or video page URL
    #[arg(value_name = "URL")]
    pub url: String,

    /// Prompt template for script generation
    #[arg(long, default_value = "default")]
    pub template: String,

    /// Save the pipeline result to a file
    #[arg(long = "save-to", value_name = "OUTPUT_FILE")]
    pub save_to: Option<PathBuf>,
}

/// Arguments for the config command
#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Write a sample configuration file
    Init(ConfigInitArgs),

    /// Show the effective configuration
    Show(ConfigShowArgs),
}

/// Arguments for config init
#[derive(Parser, Debug, Clone)]
pub struct ConfigInitArgs {
    /// Where to write the file; the extension picks the format
    #[arg(long, default_value = ".vidscript.yaml")]
    pub path: PathBuf,

    /// Force overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for config show
#[derive(Parser, Debug, Clone)]
pub struct ConfigShowArgs {
    /// Show configuration in specified format
    #[arg(short, long, value_enum, default_value = "yaml")]
    pub format: ConfigFormat,
}

/// Configuration file formats
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug, Clone)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}
