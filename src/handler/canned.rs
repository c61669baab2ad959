//! Handlers defined in configuration
//!
//! Each phase maps to a canned reply. A reply with a control token answers
//! as speech plus `stop`/`next`; a reply that sets any response field answers
//! as speech with overrides; anything else is plain speech.

use super::{HandlerError, IntentHandler, Phase};
use crate::config::Phrases;
use crate::request::NormalizedRequest;
use crate::response::{HandlerResult, ResponseOverrides};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

/// A canned reply for one phase
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CannedReply {
    /// Text to speak; one is picked at random from a list
    pub speech: Option<Phrases>,
    /// `stop` or `next`
    pub control: Option<String>,
    pub card: Option<Value>,
    pub reprompt: Option<Value>,
    pub directives: Vec<Value>,
    pub should_end_session: Option<bool>,
}

impl CannedReply {
    fn to_result(&self) -> HandlerResult {
        let speech = self
            .speech
            .as_ref()
            .and_then(Phrases::pick)
            .unwrap_or_default()
            .to_string();

        if let Some(token) = &self.control {
            return HandlerResult::SpeechWithControlToken {
                speech,
                token: token.clone(),
            };
        }

        let overrides = ResponseOverrides {
            output_speech: None,
            card: self.card.clone(),
            reprompt: self.reprompt.clone(),
            directives: self.directives.clone(),
            should_end_session: self.should_end_session,
        };
        if overrides.is_empty() {
            HandlerResult::PlainSpeech(speech)
        } else {
            HandlerResult::SpeechWithOverrides { speech, overrides }
        }
    }
}

/// Canned replies keyed by phase, as written in config
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CannedIntent {
    pub launch_request: Option<CannedReply>,
    pub intent_started: Option<CannedReply>,
    pub intent_in_progress: Option<CannedReply>,
    pub intent_completed: Option<CannedReply>,
    pub can_fulfill: Option<CannedReply>,
}

impl CannedIntent {
    fn reply(&self, phase: Phase) -> Option<&CannedReply> {
        match phase {
            Phase::LaunchRequest => self.launch_request.as_ref(),
            Phase::IntentStarted => self.intent_started.as_ref(),
            Phase::IntentInProgress => self.intent_in_progress.as_ref(),
            Phase::IntentCompleted => self.intent_completed.as_ref(),
            Phase::CanFulfill => self.can_fulfill.as_ref(),
        }
    }
}

/// Handler answering from a [`CannedIntent`]
pub struct CannedHandler {
    intent: CannedIntent,
}

impl CannedHandler {
    pub fn new(intent: CannedIntent) -> Self {
        Self { intent }
    }
}

#[async_trait]
impl IntentHandler for CannedHandler {
    fn supports(&self, phase: Phase) -> bool {
        self.intent.reply(phase).is_some()
    }

    async fn invoke(
        &self,
        phase: Phase,
        _request: &NormalizedRequest,
    ) -> Result<HandlerResult, HandlerError> {
        self.intent
            .reply(phase)
            .map(CannedReply::to_result)
            .ok_or_else(|| HandlerError::new(format!("no canned reply for {phase}")))
    }
}
