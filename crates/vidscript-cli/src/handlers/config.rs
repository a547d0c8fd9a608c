//! Configuration command handlers

use crate::cli::{ConfigAction, ConfigArgs, ConfigFormat, ConfigInitArgs, ConfigShowArgs};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use std::path::Path;

/// Handle the config command
pub fn handle_config(args: ConfigArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    match args.action {
        ConfigAction::Init(init_args) => handle_config_init(init_args, output),
        ConfigAction::Show(show_args) => handle_config_show(show_args, config, output),
    }
}

/// Handle config init subcommand
fn handle_config_init(args: ConfigInitArgs, output: &mut OutputWriter) -> Result<()> {
    if args.path.exists() && !args.force {
        return Err(Error::config(format!(
            "{} already exists; use --force to overwrite it",
            args.path.display()
        )));
    }

    Config::sample().save(&args.path)?;
    output.success(&format!("✓ Created config at {}", args.path.display()))?;
    output.info("Provider API keys are read from the environment variables named by api_key_env.")?;
    Ok(())
}

/// Handle config show subcommand
fn handle_config_show(args: ConfigShowArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let file_name = match args.format {
        ConfigFormat::Toml => "config.toml",
        ConfigFormat::Json => "config.json",
        ConfigFormat::Yaml => "config.yaml",
    };
    let content = config.render(Path::new(file_name))?;
    output.writeln(content.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;

    fn output() -> OutputWriter {
        OutputWriter::with_writer(OutputFormat::Human, false, true, 0, Box::new(std::io::sink()))
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vidscript.yaml");

        let args = || ConfigInitArgs {
            path: path.clone(),
            force: false,
        };
        handle_config_init(args(), &mut output()).unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), Config::sample());

        assert!(matches!(
            handle_config_init(args(), &mut output()),
            Err(Error::Config(_))
        ));

        let forced = ConfigInitArgs {
            path: path.clone(),
            force: true,
        };
        assert!(handle_config_init(forced, &mut output()).is_ok());
    }
}
