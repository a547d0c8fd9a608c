//! Transcribe command handler

use crate::cli::TranscribeArgs;
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use tracing::{info, instrument};
use vidscript_core::{FallbackStrategyManager, TranscribeRequest};

/// Handle the transcribe command
#[instrument(skip_all)]
pub async fn handle_transcribe(
    args: TranscribeArgs,
    manager: &FallbackStrategyManager,
    output: &mut OutputWriter,
) -> Result<()> {
    let request = TranscribeRequest {
        video_url: args.video_url,
        audio_path: args.audio_path,
    };
    let _timer = Timer::with_details(
        "transcribe_command",
        &request.source().unwrap_or_default(),
    );
    info!(source = ?request.source(), "Transcribing");

    let spinner = output.spinner("Transcribing...");
    let result = manager.transcribe(&request).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let outcome = result?;
    output.transcript(&outcome)?;
    output.attempts(&outcome.attempts)?;
    Ok(())
}
