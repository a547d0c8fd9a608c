//! Pipeline command handler: resolve, transcribe, then script

use super::utils::save_result;
use crate::cli::{OutputFormat, PipelineArgs};
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use serde::Serialize;
use tracing::{info, instrument, warn};
use vidscript_core::{
    FallbackOutcome, FallbackStrategyManager, ResolvedVideo, Script, TranscribeRequest, Transcript,
    BASIC_GENERATOR,
};

/// Every stage of one pipeline run
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    pub video: FallbackOutcome<ResolvedVideo>,
    pub transcript: FallbackOutcome<Transcript>,
    pub script: FallbackOutcome<Script>,
}

/// Run the three capabilities in sequence
///
/// Resolution and transcription failures end the run; script generation
/// degrades to a basic script.
pub async fn run_pipeline(
    manager: &FallbackStrategyManager,
    url: &str,
    template: &str,
) -> vidscript_core::Result<PipelineResult> {
    let video = manager.resolve_video(url).await?;
    info!(provider = %video.provider_used, "Video resolved");

    let request = TranscribeRequest::from_video_url(video.value.url.clone());
    let transcript = manager.transcribe(&request).await?;
    info!(provider = %transcript.provider_used, "Transcript ready");

    let script = manager
        .generate_script_or_basic(&transcript.value.text, template)
        .await;
    if script.provider_used == BASIC_GENERATOR {
        warn!("Script generation degraded to a basic script");
    }

    Ok(PipelineResult {
        video,
        transcript,
        script,
    })
}

/// Handle the pipeline command
#[instrument(skip_all, fields(url = %args.url))]
pub async fn handle_pipeline(
    args: PipelineArgs,
    manager: &FallbackStrategyManager,
    output: &mut OutputWriter,
) -> Result<()> {
    let timer = Timer::with_details("pipeline_command", &args.url);

    let spinner = output.spinner("Running pipeline...");
    let result = run_pipeline(manager, &args.url, &args.template).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let result = result?;
    let elapsed = timer.finish();

    if output.format() == OutputFormat::Human {
        output.section("Video")?;
        output.video(&result.video)?;
        output.attempts(&result.video.attempts)?;
        output.section("Transcript")?;
        output.transcript(&result.transcript)?;
        output.attempts(&result.transcript.attempts)?;
        output.section("Script")?;
        if result.script.provider_used == BASIC_GENERATOR {
            output.warning("⚠ Every script generator failed; showing a basic one-scene script")?;
        }
        output.script(&result.script)?;
        output.attempts(&result.script.attempts)?;
        output.success(&format!("✓ Pipeline completed in {:.2}s", elapsed.as_secs_f64()))?;
    } else {
        output.data(&result)?;
    }

    if let Some(path) = &args.save_to {
        save_result(path, &result)?;
        output.success(&format!("✓ Result saved to {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidscript_core::FallbackConfig;
    use vidscript_providers::{build_manager, ProvidersConfig};

    #[tokio::test]
    async fn test_default_chains_run_offline() {
        let manager = build_manager(&ProvidersConfig::default(), FallbackConfig::default()).unwrap();

        let result = run_pipeline(&manager, "https://v.douyin.com/iRNBho6/", "default")
            .await
            .unwrap();

        assert_eq!(result.video.provider_used, "LocalParser");
        assert!(result.video.value.url.contains("v26-web.douyinvod.com"));
        assert_eq!(result.transcript.provider_used, "MockTranscription");
        assert_eq!(result.script.provider_used, "SimpleParser");

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["transcript"]["providerUsed"], "MockTranscription");
        assert!(value["script"]["scenes"].as_array().is_some());
    }

    #[tokio::test]
    async fn test_invalid_url_stops_the_run() {
        let manager = build_manager(&ProvidersConfig::default(), FallbackConfig::default()).unwrap();

        let err = run_pipeline(&manager, "not a url", "default").await.unwrap_err();
        assert_eq!(err.code(), "SERVICE_UNAVAILABLE");
        assert!(manager.service_report().keys().all(|key| key.capability
            == vidscript_core::Capability::ResolveVideo));
    }
}
