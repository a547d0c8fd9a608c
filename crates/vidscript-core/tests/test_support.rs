//! Shared test support utilities for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use vidscript_core::{
    Error, FallbackConfig, FallbackStrategyManager, Provider, ResolveRequest, ResolvedVideo,
    Scene, Script, ScriptRequest, StrategyDescriptor, TranscribeRequest, Transcript,
};

/// Provider double that either always succeeds or always fails
///
/// Counts invocations so tests can prove a provider was skipped.
#[derive(Clone)]
pub struct Scripted {
    name: String,
    calls: Arc<AtomicUsize>,
    failure: Option<fn() -> Error>,
}

impl Scripted {
    pub fn ok(name: &str) -> Self {
        Self {
            name: name.to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
            failure: None,
        }
    }

    pub fn failing(name: &str, failure: fn() -> Error) -> Self {
        Self {
            failure: Some(failure),
            ..Self::ok(name)
        }
    }

    /// Fails with a retryable network error
    pub fn unreachable(name: &str) -> Self {
        Self::failing(name, || Error::network("connect ECONNREFUSED 10.0.0.7:443"))
    }

    /// Shared invocation counter
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn call(&self) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure {
            Some(failure) => Err(failure().into()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Provider<ResolveRequest, ResolvedVideo> for Scripted {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, input: &ResolveRequest) -> anyhow::Result<ResolvedVideo> {
        self.call()?;
        Ok(ResolvedVideo {
            url: input.url.clone(),
        })
    }
}

#[async_trait]
impl Provider<TranscribeRequest, Transcript> for Scripted {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, _input: &TranscribeRequest) -> anyhow::Result<Transcript> {
        self.call()?;
        Ok(Transcript {
            text: format!("transcript from {}", self.name),
            confidence: 0.9,
        })
    }
}

#[async_trait]
impl Provider<ScriptRequest, Script> for Scripted {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, input: &ScriptRequest) -> anyhow::Result<Script> {
        self.call()?;
        Ok(Script {
            title: format!("Script by {}", self.name),
            duration: 30,
            scenes: vec![Scene {
                scene_number: 1,
                timestamp: "00:00-00:30".to_string(),
                description: input.template.clone(),
                dialogue: input.text.clone(),
                notes: String::new(),
            }],
        })
    }
}

pub fn resolver(provider: Scripted, priority: i64) -> StrategyDescriptor<ResolveRequest, ResolvedVideo> {
    StrategyDescriptor::new(provider, priority)
}

pub fn transcriber(provider: Scripted, priority: i64) -> StrategyDescriptor<TranscribeRequest, Transcript> {
    StrategyDescriptor::new(provider, priority)
}

pub fn generator(provider: Scripted, priority: i64) -> StrategyDescriptor<ScriptRequest, Script> {
    StrategyDescriptor::new(provider, priority)
}

/// Yunmao(1) and MiniMax(2) unreachable, Mock(999) healthy
pub fn transcribe_manager(config: FallbackConfig) -> (FallbackStrategyManager, Scripted, Scripted, Scripted) {
    let yunmao = Scripted::unreachable("Yunmao");
    let minimax = Scripted::unreachable("MiniMax");
    let mock = Scripted::ok("Mock");

    let mut manager = FallbackStrategyManager::new(config);
    manager
        .register(transcriber(yunmao.clone(), 1))
        .register(transcriber(minimax.clone(), 2))
        .register(transcriber(mock.clone(), 999));

    (manager, yunmao, minimax, mock)
}

pub fn video_request() -> TranscribeRequest {
    TranscribeRequest::from_video_url("https://v26-web.douyinvod.com/abc")
}
