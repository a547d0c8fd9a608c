//! Priority-ordered fallback across interchangeable providers
//!
//! Each capability owns a [`StrategyChain`]: strategies stored in declaration
//! order and sorted by priority only when a request is dispatched, so a
//! priority can be changed on a live manager. A chain is walked strictly
//! sequentially and stops at the first success. Every failure is recorded in
//! the shared [`ProviderHealthTracker`] and swallowed; only the aggregate
//! failure reaches the caller.

use crate::classifier::ErrorHandler;
use crate::config::FallbackConfig;
use crate::error::{Error, Result};
use crate::health::{ProviderHealthTracker, ServiceReport};
use crate::provider::Provider;
use crate::types::{
    Capability, ProviderKey, ResolveRequest, ResolvedVideo, Script, ScriptRequest,
    TranscribeRequest, Transcript,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Provider name reported when script generation degrades to [`Script::basic`]
pub const BASIC_GENERATOR: &str = "BasicGenerator";

/// Predicate deciding whether a strategy can attempt an input at all
pub type Condition<I> = Arc<dyn Fn(&I) -> bool + Send + Sync>;

/// One provider registered for a capability
pub struct StrategyDescriptor<I, O> {
    name: String,
    priority: i64,
    provider: Arc<dyn Provider<I, O>>,
    condition: Option<Condition<I>>,
}

impl<I, O> StrategyDescriptor<I, O>
where
    I: Send + Sync,
{
    /// Register `provider` under its own name; lower priority is tried first
    pub fn new<P>(provider: P, priority: i64) -> Self
    where
        P: Provider<I, O> + 'static,
    {
        Self::from_arc(Arc::new(provider), priority)
    }

    /// Register a shared provider
    pub fn from_arc(provider: Arc<dyn Provider<I, O>>, priority: i64) -> Self {
        Self {
            name: provider.name().to_string(),
            priority,
            provider,
            condition: None,
        }
    }

    /// Override the name used for health tracking and reporting
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Only attempt inputs for which `condition` holds
    pub fn with_condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&I) -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Arc::new(condition));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i64 {
        self.priority
    }

    pub fn is_conditional(&self) -> bool {
        self.condition.is_some()
    }

    fn applies_to(&self, input: &I) -> bool {
        self.condition.as_ref().map_or(true, |condition| condition(input))
    }
}

impl<I, O> Clone for StrategyDescriptor<I, O> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            priority: self.priority,
            provider: Arc::clone(&self.provider),
            condition: self.condition.clone(),
        }
    }
}

impl<I, O> fmt::Debug for StrategyDescriptor<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyDescriptor")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("conditional", &self.condition.is_some())
            .finish()
    }
}

/// Listing entry for a registered strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategySummary {
    pub name: String,
    pub priority: i64,
    pub conditional: bool,
}

/// One invoked strategy within a fallback run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackAttempt {
    pub provider: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl FallbackAttempt {
    fn succeeded(provider: &str, duration_ms: u64) -> Self {
        Self {
            provider: provider.to_string(),
            success: true,
            code: None,
            retryable: None,
            error: None,
            duration_ms,
        }
    }

    fn failed(provider: &str, error: &anyhow::Error, duration_ms: u64) -> Self {
        let err: &(dyn StdError + 'static) = error.as_ref();
        Self {
            provider: provider.to_string(),
            success: false,
            code: Some(ErrorHandler::code(err).to_string()),
            retryable: Some(ErrorHandler::is_retryable(err)),
            error: Some(format!("{:#}", error)),
            duration_ms,
        }
    }

    fn to_context(&self) -> Value {
        json!({
            "provider": self.provider,
            "code": self.code,
            "retryable": self.retryable,
            "reason": self.error,
        })
    }
}

/// A successful result tagged with the provider that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackOutcome<O> {
    #[serde(flatten)]
    pub value: O,
    pub provider_used: String,
    pub attempts: Vec<FallbackAttempt>,
}

impl<O> FallbackOutcome<O> {
    pub fn into_value(self) -> O {
        self.value
    }
}

/// Aggregate failure together with what was tried
struct Exhausted {
    error: Error,
    attempts: Vec<FallbackAttempt>,
}

/// Strategies registered for one capability
#[derive(Debug)]
pub struct StrategyChain<I, O> {
    capability: Capability,
    strategies: Vec<StrategyDescriptor<I, O>>,
}

impl<I, O> StrategyChain<I, O>
where
    I: Send + Sync,
    O: Send,
{
    pub fn new(capability: Capability) -> Self {
        Self {
            capability,
            strategies: Vec::new(),
        }
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Append a strategy in declaration order
    pub fn push(&mut self, strategy: StrategyDescriptor<I, O>) {
        self.strategies.push(strategy);
    }

    /// Change the priority of a registered strategy; false if unknown
    pub fn set_priority(&mut self, name: &str, priority: i64) -> bool {
        match self.strategies.iter_mut().find(|s| s.name == name) {
            Some(strategy) => {
                strategy.priority = priority;
                true
            }
            None => false,
        }
    }

    /// Strategies ascending by priority, ties in declaration order
    pub fn dispatch_order(&self) -> Vec<&StrategyDescriptor<I, O>> {
        let mut ordered: Vec<_> = self.strategies.iter().collect();
        // sort_by_key is stable
        ordered.sort_by_key(|strategy| strategy.priority);
        ordered
    }

    pub fn summaries(&self) -> Vec<StrategySummary> {
        self.dispatch_order()
            .into_iter()
            .map(|strategy| StrategySummary {
                name: strategy.name.clone(),
                priority: strategy.priority,
                conditional: strategy.is_conditional(),
            })
            .collect()
    }

    /// Run the chain until one strategy succeeds
    pub async fn execute(
        &self,
        health: &ProviderHealthTracker,
        input: &I,
    ) -> Result<FallbackOutcome<O>> {
        self.run(health, input).await.map_err(|exhausted| exhausted.error)
    }

    async fn run(
        &self,
        health: &ProviderHealthTracker,
        input: &I,
    ) -> std::result::Result<FallbackOutcome<O>, Exhausted> {
        if self.strategies.is_empty() {
            return Err(Exhausted {
                error: Error::configuration(format!(
                    "No strategies registered for capability '{}'",
                    self.capability
                ))
                .with_context("capability", self.capability.as_str()),
                attempts: Vec::new(),
            });
        }

        let deadline = health.config().overall_deadline;
        let started = Instant::now();
        let mut attempts = Vec::new();
        let mut skipped = Vec::new();
        let mut deadline_exceeded = false;

        for strategy in self.dispatch_order() {
            if !strategy.applies_to(input) {
                debug!(capability = %self.capability, provider = %strategy.name, "Condition not met, skipping");
                continue;
            }

            let key = ProviderKey::new(self.capability, strategy.name.as_str());
            if !health.is_available(&key) {
                warn!(provider = %key, "Skipped unavailable provider");
                skipped.push(strategy.name.clone());
                continue;
            }

            let remaining = match deadline {
                Some(limit) => match limit.checked_sub(started.elapsed()) {
                    Some(remaining) if !remaining.is_zero() => Some(remaining),
                    _ => {
                        deadline_exceeded = true;
                        break;
                    }
                },
                None => None,
            };

            let call_started = Instant::now();
            let result = match remaining {
                Some(remaining) => {
                    match tokio::time::timeout(remaining, strategy.provider.invoke(input)).await {
                        Ok(result) => result,
                        Err(_) => {
                            deadline_exceeded = true;
                            Err(anyhow::Error::new(
                                Error::timeout(key.to_string(), remaining.as_millis() as u64)
                                    .with_context("deadlineExceeded", true),
                            ))
                        }
                    }
                }
                None => strategy.provider.invoke(input).await,
            };
            let duration_ms = call_started.elapsed().as_millis() as u64;

            match result {
                Ok(value) => {
                    health.record_success(&key);
                    info!(provider = %key, duration_ms, "Provider succeeded");
                    attempts.push(FallbackAttempt::succeeded(&strategy.name, duration_ms));
                    return Ok(FallbackOutcome {
                        value,
                        provider_used: strategy.name.clone(),
                        attempts,
                    });
                }
                Err(error) => {
                    let err: &(dyn StdError + 'static) = error.as_ref();
                    health.record_failure(&key, err);
                    warn!(
                        provider = %key,
                        code = ErrorHandler::code(err),
                        retryable = ErrorHandler::is_retryable(err),
                        duration_ms,
                        "Provider failed: {:#}",
                        error
                    );
                    attempts.push(FallbackAttempt::failed(&strategy.name, &error, duration_ms));
                    if deadline_exceeded {
                        break;
                    }
                }
            }
        }

        let error = Error::service_unavailable(self.capability.as_str(), Some("all strategies failed"))
            .with_context("capability", self.capability.as_str())
            .with_context(
                "attempts",
                attempts.iter().map(FallbackAttempt::to_context).collect::<Vec<_>>(),
            )
            .with_context("skipped", skipped)
            .with_context("deadlineExceeded", deadline_exceeded);

        Err(Exhausted { error, attempts })
    }
}

/// Request types that select a capability chain
pub trait CapabilityRequest: Send + Sync + Sized + 'static {
    type Output: Send + 'static;

    const CAPABILITY: Capability;

    fn chain(manager: &FallbackStrategyManager) -> &StrategyChain<Self, Self::Output>;

    fn chain_mut(manager: &mut FallbackStrategyManager) -> &mut StrategyChain<Self, Self::Output>;
}

macro_rules! capability_request {
    ($request:ty => $output:ty, $capability:expr, $field:ident) => {
        impl CapabilityRequest for $request {
            type Output = $output;

            const CAPABILITY: Capability = $capability;

            fn chain(manager: &FallbackStrategyManager) -> &StrategyChain<Self, Self::Output> {
                &manager.$field
            }

            fn chain_mut(
                manager: &mut FallbackStrategyManager,
            ) -> &mut StrategyChain<Self, Self::Output> {
                &mut manager.$field
            }
        }
    };
}

capability_request!(ResolveRequest => ResolvedVideo, Capability::ResolveVideo, resolve);
capability_request!(TranscribeRequest => Transcript, Capability::Transcribe, transcribe);
capability_request!(ScriptRequest => Script, Capability::GenerateScript, generate);

/// Fallback orchestration for every capability
#[derive(Debug)]
pub struct FallbackStrategyManager {
    health: Arc<ProviderHealthTracker>,
    resolve: StrategyChain<ResolveRequest, ResolvedVideo>,
    transcribe: StrategyChain<TranscribeRequest, Transcript>,
    generate: StrategyChain<ScriptRequest, Script>,
}

impl Default for FallbackStrategyManager {
    fn default() -> Self {
        Self::new(FallbackConfig::default())
    }
}

impl FallbackStrategyManager {
    /// Manager with its own health tracker and no strategies
    pub fn new(config: FallbackConfig) -> Self {
        Self::with_health(Arc::new(ProviderHealthTracker::new(config)))
    }

    /// Manager sharing an existing health tracker
    pub fn with_health(health: Arc<ProviderHealthTracker>) -> Self {
        Self {
            health,
            resolve: StrategyChain::new(Capability::ResolveVideo),
            transcribe: StrategyChain::new(Capability::Transcribe),
            generate: StrategyChain::new(Capability::GenerateScript),
        }
    }

    pub fn config(&self) -> &FallbackConfig {
        self.health.config()
    }

    /// Add a strategy to the chain of its request type
    pub fn register<R: CapabilityRequest>(
        &mut self,
        strategy: StrategyDescriptor<R, R::Output>,
    ) -> &mut Self {
        debug!(
            capability = %R::CAPABILITY,
            provider = strategy.name(),
            priority = strategy.priority(),
            "Registered strategy"
        );
        R::chain_mut(self).push(strategy);
        self
    }

    pub fn chain<R: CapabilityRequest>(&self) -> &StrategyChain<R, R::Output> {
        R::chain(self)
    }

    /// Registered strategies of a capability in dispatch order
    pub fn strategies(&self, capability: Capability) -> Vec<StrategySummary> {
        match capability {
            Capability::ResolveVideo => self.resolve.summaries(),
            Capability::Transcribe => self.transcribe.summaries(),
            Capability::GenerateScript => self.generate.summaries(),
        }
    }

    /// Change a strategy's priority; false if the name is not registered
    pub fn set_priority(&mut self, capability: Capability, name: &str, priority: i64) -> bool {
        let changed = match capability {
            Capability::ResolveVideo => self.resolve.set_priority(name, priority),
            Capability::Transcribe => self.transcribe.set_priority(name, priority),
            Capability::GenerateScript => self.generate.set_priority(name, priority),
        };
        if changed {
            info!(capability = %capability, provider = name, priority, "Strategy priority changed");
        }
        changed
    }

    /// Try every applicable, available strategy in priority order
    ///
    /// Returns the first success tagged with the provider that produced it.
    /// Fails with a configuration error when the capability has no strategies
    /// and with `SERVICE_UNAVAILABLE` once every strategy has failed or been
    /// skipped.
    pub async fn execute_with_fallback<R: CapabilityRequest>(
        &self,
        input: &R,
    ) -> Result<FallbackOutcome<R::Output>> {
        R::chain(self).execute(&self.health, input).await
    }

    pub async fn resolve_video(&self, url: &str) -> Result<FallbackOutcome<ResolvedVideo>> {
        self.execute_with_fallback(&ResolveRequest::new(url)).await
    }

    pub async fn transcribe(&self, request: &TranscribeRequest) -> Result<FallbackOutcome<Transcript>> {
        self.execute_with_fallback(request).await
    }

    pub async fn generate_script(&self, text: &str, template: &str) -> Result<FallbackOutcome<Script>> {
        self.execute_with_fallback(&ScriptRequest::new(text, template)).await
    }

    /// Like [`generate_script`](Self::generate_script), but degrades to a
    /// one-scene [`Script::basic`] when every generator fails
    pub async fn generate_script_or_basic(&self, text: &str, template: &str) -> FallbackOutcome<Script> {
        match self.generate.run(&self.health, &ScriptRequest::new(text, template)).await {
            Ok(outcome) => outcome,
            Err(Exhausted { error, attempts }) => {
                ErrorHandler::log_error(&error, None);
                warn!("Script generation degraded to basic script");
                FallbackOutcome {
                    value: Script::basic(text),
                    provider_used: BASIC_GENERATOR.to_string(),
                    attempts,
                }
            }
        }
    }

    /// Shared health tracker
    pub fn health(&self) -> &Arc<ProviderHealthTracker> {
        &self.health
    }

    /// Snapshot of every provider's health
    pub fn service_report(&self) -> ServiceReport {
        self.health.report()
    }

    /// Force a provider back to available; false if it was never seen
    pub fn reset_service(&self, key: &ProviderKey) -> bool {
        self.health.reset(key)
    }
}
