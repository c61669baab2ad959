//! Mock handlers for testing
//!
//! These mocks let dispatcher tests observe calls, force failures, and hold a
//! handler mid-invocation.

use super::{HandlerError, IntentHandler, Phase};
use crate::request::NormalizedRequest;
use crate::response::HandlerResult;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

// ============================================================================
// Recording Handler
// ============================================================================

/// Returns a fixed result and records every invocation
pub struct RecordingHandler {
    phases: HashSet<Phase>,
    result: HandlerResult,
    pub calls: Mutex<Vec<(Phase, NormalizedRequest)>>,
}

impl RecordingHandler {
    pub fn new(phases: &[Phase], result: HandlerResult) -> Arc<Self> {
        Arc::new(Self {
            phases: phases.iter().copied().collect(),
            result,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn recorded_phases(&self) -> Vec<Phase> {
        self.calls.lock().unwrap().iter().map(|(p, _)| *p).collect()
    }
}

#[async_trait]
impl IntentHandler for RecordingHandler {
    fn supports(&self, phase: Phase) -> bool {
        self.phases.contains(&phase)
    }

    async fn invoke(
        &self,
        phase: Phase,
        request: &NormalizedRequest,
    ) -> Result<HandlerResult, HandlerError> {
        self.calls.lock().unwrap().push((phase, request.clone()));
        Ok(self.result.clone())
    }
}

// ============================================================================
// Failing Handlers
// ============================================================================

/// Supports every phase and always fails
pub struct FailingHandler;

#[async_trait]
impl IntentHandler for FailingHandler {
    fn supports(&self, _phase: Phase) -> bool {
        true
    }

    async fn invoke(
        &self,
        _phase: Phase,
        _request: &NormalizedRequest,
    ) -> Result<HandlerResult, HandlerError> {
        Err(HandlerError::new("device offline"))
    }
}

/// Supports every phase and panics
pub struct PanickingHandler;

#[async_trait]
impl IntentHandler for PanickingHandler {
    fn supports(&self, _phase: Phase) -> bool {
        true
    }

    async fn invoke(
        &self,
        _phase: Phase,
        _request: &NormalizedRequest,
    ) -> Result<HandlerResult, HandlerError> {
        panic!("handler bug");
    }
}

// ============================================================================
// Gated Handler
// ============================================================================

/// Blocks inside `invoke` until released
pub struct GatedHandler {
    gate: Notify,
    pub entered: Notify,
    result: HandlerResult,
}

impl GatedHandler {
    pub fn new(result: HandlerResult) -> Arc<Self> {
        Arc::new(Self {
            gate: Notify::new(),
            entered: Notify::new(),
            result,
        })
    }

    /// Let one blocked (or the next) invocation finish
    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl IntentHandler for GatedHandler {
    fn supports(&self, _phase: Phase) -> bool {
        true
    }

    async fn invoke(
        &self,
        _phase: Phase,
        _request: &NormalizedRequest,
    ) -> Result<HandlerResult, HandlerError> {
        self.entered.notify_one();
        self.gate.notified().await;
        Ok(self.result.clone())
    }
}
