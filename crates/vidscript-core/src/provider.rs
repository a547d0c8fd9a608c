//! Provider adapter contract
//!
//! Every vendor adapter implements [`Provider`] for the capability it serves.
//! Adapters own their own timeouts; the engine never pre-empts a call unless
//! an overall deadline is configured.

use crate::types::{
    ResolveRequest, ResolvedVideo, Script, ScriptRequest, TranscribeRequest, Transcript,
};
use async_trait::async_trait;

/// One concrete implementation of a capability
///
/// Failures are reported as `anyhow::Error`; taxonomy errors anywhere in the
/// chain drive classification, anything else is classified heuristically.
#[async_trait]
pub trait Provider<I, O>: Send + Sync {
    /// Stable provider identity, also used as the health-map key
    fn name(&self) -> &str;

    /// Perform the call
    async fn invoke(&self, input: &I) -> anyhow::Result<O>;
}

/// resolve-video: `url → {url}`
pub type VideoResolver = dyn Provider<ResolveRequest, ResolvedVideo>;

/// transcribe: `{videoUrl?, audioPath?} → {text, confidence}`
pub type Transcriber = dyn Provider<TranscribeRequest, Transcript>;

/// generate-script: `(text, template) → structured script`
pub type ScriptGenerator = dyn Provider<ScriptRequest, Script>;

