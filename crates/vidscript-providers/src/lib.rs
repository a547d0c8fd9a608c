//! Vidscript Providers - Adapters behind the fallback engine
//!
//! This crate contains the concrete strategies for each capability:
//! - resolve-video: [`LocalParser`], [`DirectUrl`], [`HttpResolver`]
//! - transcribe: [`MockTranscriber`], [`HttpTranscriber`]
//! - generate-script: [`SimpleScriptParser`], [`HttpScriptGenerator`]
//!
//! and the [`ProviderRegistry`] that assembles them from configuration.

pub mod http;
pub mod registry;
pub mod resolve;
pub mod script;
pub mod transcribe;

pub use http::HttpEndpoint;
pub use registry::{build_manager, ProviderRegistry, ProvidersConfig, StrategyConfig, StrategyKind};
pub use resolve::{DirectUrl, HttpResolver, LocalParser};
pub use script::{basic_script, HttpScriptGenerator, SimpleScriptParser};
pub use transcribe::{requires_video_url, HttpTranscriber, MockTranscriber};
