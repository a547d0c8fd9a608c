//! Generate command handler

use super::utils::{read_text, save_result};
use crate::cli::GenerateArgs;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use tracing::{info, instrument, warn};
use vidscript_core::{FallbackStrategyManager, BASIC_GENERATOR};

/// Handle the generate command
#[instrument(skip_all, fields(template = %args.template))]
pub async fn handle_generate(
    args: GenerateArgs,
    manager: &FallbackStrategyManager,
    output: &mut OutputWriter,
) -> Result<()> {
    let text = match (&args.text, &args.text_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => read_text(path)?,
        (None, None) => return Err(Error::invalid_args("either --text or --text-file is required")),
    };
    let _timer = Timer::with_details("generate_command", &format!("{} chars", text.chars().count()));
    info!("Generating script");

    let spinner = output.spinner("Generating script...");
    let result = if args.basic_fallback {
        Ok(manager.generate_script_or_basic(&text, &args.template).await)
    } else {
        manager.generate_script(&text, &args.template).await
    };
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let outcome = result?;
    if outcome.provider_used == BASIC_GENERATOR {
        warn!("Every script generator failed; returning a basic script");
        output.warning("⚠ Every script generator failed; showing a basic one-scene script")?;
    }

    output.script(&outcome)?;
    output.attempts(&outcome.attempts)?;

    if let Some(path) = &args.save_to {
        save_result(path, &outcome)?;
        output.success(&format!("✓ Script saved to {}", path.display()))?;
    }
    Ok(())
}
