//! Resolve command handler

use crate::cli::ResolveArgs;
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use tracing::{info, instrument};
use vidscript_core::FallbackStrategyManager;

/// Handle the resolve command
#[instrument(skip_all, fields(url = %args.url))]
pub async fn handle_resolve(
    args: ResolveArgs,
    manager: &FallbackStrategyManager,
    output: &mut OutputWriter,
) -> Result<()> {
    let _timer = Timer::with_details("resolve_command", &args.url);
    info!("Resolving video URL");

    let spinner = output.spinner("Resolving video URL...");
    let result = manager.resolve_video(&args.url).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let outcome = result?;
    output.video(&outcome)?;
    output.attempts(&outcome.attempts)?;
    Ok(())
}
