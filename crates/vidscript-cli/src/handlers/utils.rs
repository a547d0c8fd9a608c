//! Shared utilities for command handlers

use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::debug;
use vidscript_core::FallbackStrategyManager;

/// Build the fallback engine from the configured chains
pub fn build_manager(config: &Config) -> Result<FallbackStrategyManager> {
    let fallback = config.fallback.to_fallback_config()?;
    let manager = vidscript_providers::build_manager(&config.providers, fallback)
        .map_err(|e| Error::config(e.message().to_string()))?;
    debug!("Fallback engine ready");
    Ok(manager)
}

/// Print the provider health report
pub fn print_report(manager: &FallbackStrategyManager, output: &mut OutputWriter) -> Result<()> {
    output.section("Provider Health")?;
    output.report(&manager.service_report())
}

/// Read a text file, mapping a missing file to `FileNotFound`
pub fn read_text(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(fs::read_to_string(path)?)
}

/// Save a result as pretty JSON, or YAML when the path says so
pub fn save_result<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let is_yaml = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s == "yaml" || s == "yml")
        .unwrap_or(false);

    let content = if is_yaml {
        serde_yaml::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };

    debug!("Writing result to file: {}", path.display());
    fs::write(path, content)?;
    Ok(())
}
