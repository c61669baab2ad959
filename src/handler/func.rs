//! Closure-backed handler

use super::{HandlerError, IntentHandler, Phase};
use crate::request::NormalizedRequest;
use crate::response::HandlerResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

type PhaseFn =
    Arc<dyn Fn(&NormalizedRequest) -> Result<HandlerResult, HandlerError> + Send + Sync>;

/// Handler built from one closure per supported phase
#[derive(Clone, Default)]
pub struct FnHandler {
    phases: HashMap<Phase, PhaseFn>,
}

impl FnHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `phase` with `f`
    #[must_use]
    pub fn on<F>(mut self, phase: Phase, f: F) -> Self
    where
        F: Fn(&NormalizedRequest) -> Result<HandlerResult, HandlerError> + Send + Sync + 'static,
    {
        self.phases.insert(phase, Arc::new(f));
        self
    }
}

#[async_trait]
impl IntentHandler for FnHandler {
    fn supports(&self, phase: Phase) -> bool {
        self.phases.contains_key(&phase)
    }

    async fn invoke(
        &self,
        phase: Phase,
        request: &NormalizedRequest,
    ) -> Result<HandlerResult, HandlerError> {
        match self.phases.get(&phase) {
            Some(f) => f(request),
            None => Err(HandlerError::new(format!("phase {phase} not implemented"))),
        }
    }
}
