//! Vidscript CLI - Command-line front end for the provider fallback engine
//!
//! This is the main entry point for the Vidscript CLI application, providing
//! commands for resolving share links, transcribing videos, and generating
//! scripts through ordered chains of providers.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use cli::{Cli, Commands};
use colored::control;
use config::Config;
use error::Result;
use logging::{timing::Timer, LoggingConfig};
use output::OutputWriter;
use std::process;
use tracing::instrument;
use tracing_appender::non_blocking::WorkerGuard;

#[tokio::main]
async fn main() {
    // Provider API keys may live in a local .env file
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    // Load configuration before logging so the file can shape it
    let config = Config::load_with_file(cli.config.as_deref());

    let use_color = cli.use_color()
        && config.as_ref().map(|c| c.output.color).unwrap_or(true);
    control::set_override(use_color);

    let log_guard = match init_logging(&cli, config.as_ref().ok()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            None
        }
    };

    let result = match config {
        Ok(config) => run(&cli, config, use_color).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            drop(log_guard);
            process::exit(0);
        }
        Err(e) => {
            let formatted = error::format_error(&e, cli.output, use_color, cli.verbosity_level() > 0);
            if matches!(e, error::Error::Core(_)) && cli.output != cli::OutputFormat::Human {
                println!("{}", formatted);
            } else {
                eprintln!("{}", formatted);
            }

            if e.should_show_help() {
                eprintln!("\nFor more information, try '--help'");
            }

            drop(log_guard);
            process::exit(e.exit_code());
        }
    }
}

/// Main application logic
#[instrument(skip_all, fields(command = ?cli.command))]
async fn run(cli: &Cli, config: Config, use_color: bool) -> Result<()> {
    let _timer = Timer::new("cli_execution");

    let mut output = OutputWriter::new(cli.output, use_color, cli.quiet, cli.verbosity_level());
    if !config.output.progress {
        output = output.without_progress();
    }

    tracing::info!(
        command = ?cli.command,
        verbosity = cli.verbosity_level(),
        "Executing command"
    );

    let command = match &cli.command {
        Commands::Config(args) => return handlers::handle_config(args.clone(), &config, &mut output),
        Commands::Completions(args) => return handlers::handle_completions(args.clone()),
        command => command,
    };

    let manager = handlers::build_manager(&config)?;

    let result = match command {
        Commands::Resolve(args) => handlers::handle_resolve(args.clone(), &manager, &mut output).await,
        Commands::Transcribe(args) => {
            handlers::handle_transcribe(args.clone(), &manager, &mut output).await
        }
        Commands::Generate(args) => handlers::handle_generate(args.clone(), &manager, &mut output).await,
        Commands::Pipeline(args) => handlers::handle_pipeline(args.clone(), &manager, &mut output).await,
        Commands::Providers => handlers::handle_providers(&manager, &mut output),
        Commands::Config(_) | Commands::Completions(_) => Ok(()),
    };

    // The report is most useful after a failure, so print it either way
    if cli.report {
        handlers::print_report(&manager, &mut output)?;
    }

    result
}

/// Initialize the logging system
fn init_logging(cli: &Cli, config: Option<&Config>) -> Result<Option<WorkerGuard>> {
    let mut logging_config = LoggingConfig::from_verbosity(cli.verbosity_level());

    if let Some(config) = config {
        logging_config.merge_with_settings(&config.logging, cli.verbosity_level());
    }

    logging_config.merge_with_env();

    // If quiet mode, only log errors
    if cli.quiet {
        logging_config.level = "error".to_string();
        logging_config.console = false;
    }

    logging::init_logging(logging_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["vidscript", "providers"]);
        assert_eq!(cli.verbosity_level(), 0);

        let cli = Cli::parse_from(["vidscript", "-vv", "resolve", "https://v.douyin.com/abc/"]);
        assert_eq!(cli.verbosity_level(), 2);

        let cli = Cli::parse_from(["vidscript", "--quiet", "pipeline", "https://v.douyin.com/abc/"]);
        assert_eq!(cli.verbosity_level(), 0);
    }

    #[tokio::test]
    async fn test_run_with_default_config() {
        let cli = Cli::parse_from(["vidscript", "--quiet", "-o", "json", "resolve", "https://www.example.com/v/1"]);
        assert!(run(&cli, Config::default(), false).await.is_ok());

        let cli = Cli::parse_from(["vidscript", "--quiet", "resolve", "not a url"]);
        let err = run(&cli, Config::default(), false).await.unwrap_err();
        assert_eq!(err.exit_code(), error::EXIT_RETRYABLE);
    }
}
