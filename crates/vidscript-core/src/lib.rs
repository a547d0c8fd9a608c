//! Vidscript Core - Fallback orchestration for unreliable providers
//!
//! This crate coordinates calls to interchangeable third-party providers
//! (video resolvers, speech-to-text engines, script generators) and degrades
//! gracefully when one of them is slow, throttled or down.
//!
//! # Main Components
//!
//! - **Error Taxonomy**: one tagged [`Error`] type with machine codes, safe user messages and fixed retryability
//! - **Error Classifier**: [`ErrorHandler`] decides retryability, user messages, retry delays and log severity for any error
//! - **Health Tracking**: [`ProviderHealthTracker`] keeps a circuit breaker per (capability, provider)
//! - **Fallback Manager**: [`FallbackStrategyManager`] walks priority-ordered strategy chains until one succeeds
//!
//! # Example
//!
//! ```no_run
//! use vidscript_core::{FallbackConfig, FallbackStrategyManager, Result};
//!
//! async fn example() -> Result<()> {
//!     let manager = FallbackStrategyManager::new(FallbackConfig::default());
//!     // register strategies, then:
//!     let outcome = manager.resolve_video("https://v.douyin.com/abc").await?;
//!     println!("{} via {}", outcome.value.url, outcome.provider_used);
//!     Ok(())
//! }
//! ```

pub mod classifier;
pub mod config;
pub mod error;
pub mod fallback;
pub mod health;
pub mod provider;
pub mod retry;
pub mod types;

// Re-export main types for convenience
pub use classifier::{ErrorHandler, ErrorLogRecord};
pub use config::FallbackConfig;
pub use error::{Context, Error, ErrorBody, ErrorKind, ErrorResponse, Result, Severity};
pub use fallback::{
    CapabilityRequest, FallbackAttempt, FallbackOutcome, FallbackStrategyManager, StrategyChain,
    StrategyDescriptor, StrategySummary, BASIC_GENERATOR,
};
pub use health::{ProviderHealthTracker, ProviderStatus, ServiceReport};
pub use provider::{Provider, ScriptGenerator, Transcriber, VideoResolver};
pub use retry::{execute_with_retry, RetryDecision, RetryPolicy};
pub use types::{
    Capability, ProviderKey, ResolveRequest, ResolvedVideo, Scene, Script, ScriptRequest,
    TranscribeRequest, Transcript,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
