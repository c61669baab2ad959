//! Intent handlers
//!
//! A handler is registered under a name (an intent name, or the configured
//! launch handler name) and implements some subset of the dialog [`Phase`]s.

mod canned;
mod func;

#[cfg(test)]
pub mod testing;

pub use canned::{CannedHandler, CannedIntent};
pub use func::FnHandler;

use crate::config::SkillConfig;
use crate::request::NormalizedRequest;
use crate::response::HandlerResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Handler entry points, one per dialog step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    LaunchRequest,
    IntentStarted,
    IntentInProgress,
    IntentCompleted,
    CanFulfill,
}

impl Phase {
    #[cfg(test)]
    pub const ALL: [Phase; 5] = [
        Phase::LaunchRequest,
        Phase::IntentStarted,
        Phase::IntentInProgress,
        Phase::IntentCompleted,
        Phase::CanFulfill,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::LaunchRequest => "launchRequest",
            Phase::IntentStarted => "intentStarted",
            Phase::IntentInProgress => "intentInProgress",
            Phase::IntentCompleted => "intentCompleted",
            Phase::CanFulfill => "canFulfill",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by a handler
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HandlerError {
    pub message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A collaborator that answers one or more dialog phases
#[async_trait]
pub trait IntentHandler: Send + Sync {
    /// Whether `phase` can be invoked on this handler
    fn supports(&self, phase: Phase) -> bool;

    /// Produce a result for `phase`. Only called for supported phases.
    async fn invoke(
        &self,
        phase: Phase,
        request: &NormalizedRequest,
    ) -> Result<HandlerResult, HandlerError>;
}

/// Logging wrapper for handlers
struct LoggingHandler {
    inner: Arc<dyn IntentHandler>,
    name: String,
}

#[async_trait]
impl IntentHandler for LoggingHandler {
    fn supports(&self, phase: Phase) -> bool {
        self.inner.supports(phase)
    }

    async fn invoke(
        &self,
        phase: Phase,
        request: &NormalizedRequest,
    ) -> Result<HandlerResult, HandlerError> {
        let start = std::time::Instant::now();
        let result = self.inner.invoke(phase, request).await;
        let duration = start.elapsed();

        match &result {
            Ok(_) => tracing::debug!(
                handler = %self.name,
                phase = %phase,
                duration_ms = %duration.as_millis(),
                "Handler completed"
            ),
            Err(e) => tracing::error!(
                handler = %self.name,
                phase = %phase,
                duration_ms = %duration.as_millis(),
                error = %e,
                "Exception calling intent handler"
            ),
        }

        result
    }
}

/// Registry of handlers by name
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn IntentHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the handlers defined in `config.intents`
    pub fn from_config(config: &SkillConfig) -> Self {
        let mut registry = Self::new();
        for (name, intent) in &config.intents {
            registry.register(name.clone(), Arc::new(CannedHandler::new(intent.clone())));
        }
        registry
    }

    /// Register `handler` under `name`, replacing any previous one
    pub fn register(&mut self, name: impl Into<String>, handler: Arc<dyn IntentHandler>) {
        let name = name.into();
        let wrapped = Arc::new(LoggingHandler {
            inner: handler,
            name: name.clone(),
        });
        if self.handlers.insert(name.clone(), wrapped).is_some() {
            tracing::warn!(handler = %name, "Replacing previously registered handler");
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn IntentHandler>> {
        self.handlers.get(name).cloned()
    }

    /// Registered handler names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }
}
