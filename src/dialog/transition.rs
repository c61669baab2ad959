//! Pure dialog transition function
//!
//! Maps the latest request of a session to an [`Action`] and the [`Effect`]s
//! that precede it. No I/O happens here.

use super::{Action, Effect, Fallback};
use crate::handler::Phase;
use crate::request::{ConfirmationStatus, DialogState, NormalizedRequest, RequestType};
use crate::response::Envelope;

/// Inputs to a transition besides the request itself
#[derive(Debug, Clone, Copy)]
pub struct DialogContext<'a> {
    /// Handler name used for launch requests
    pub launch_handler: &'a str,
}

/// Result of a transition
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub action: Action,
    pub effects: Vec<Effect>,
}

impl Transition {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Whether applying this transition removes the session
    pub fn clears_session(&self) -> bool {
        self.effects.contains(&Effect::ClearSession)
    }
}

fn invoke(handler: &str, phase: Phase, fallback: Fallback) -> Action {
    Action::Invoke {
        handler: handler.to_string(),
        phase,
        fallback,
    }
}

/// Decide how to answer `request`
pub fn transition(request: &NormalizedRequest, context: &DialogContext<'_>) -> Transition {
    match &request.request_type {
        // Skill invoked without a specific intent
        RequestType::LaunchRequest => Transition::new(invoke(
            context.launch_handler,
            Phase::LaunchRequest,
            Fallback::PlainError,
        )),

        RequestType::IntentRequest => intent_transition(request),

        // Session ended for any reason other than us closing it
        RequestType::SessionEndedRequest => Transition::new(Action::Respond(Envelope::empty()))
            .with_effect(Effect::LogSessionEnded {
                error: request.error_message.clone(),
            })
            .with_effect(Effect::ClearSession),

        // Platform asks whether we could fulfill the intent
        RequestType::CanFulfillIntentRequest => Transition::new(invoke(
            &request.intent_name,
            Phase::CanFulfill,
            Fallback::EmptyEnvelope,
        )),

        RequestType::Other(kind) => Transition::new(Action::PlainError)
            .with_effect(Effect::LogAnomaly {
                message: format!("Non-standard request type {kind:?} cannot be handled"),
            })
            .with_effect(Effect::ClearSession),
    }
}

fn intent_transition(request: &NormalizedRequest) -> Transition {
    let intent = request.intent_name.as_str();

    match &request.dialog_state {
        // No dialog model; nothing is invoked
        DialogState::Empty => Transition::new(Action::Respond(Envelope::ending())),

        DialogState::Started => {
            Transition::new(invoke(intent, Phase::IntentStarted, Fallback::Delegate))
        }

        DialogState::InProgress => {
            Transition::new(invoke(intent, Phase::IntentInProgress, Fallback::Delegate))
        }

        // COMPLETED is also sent when the user denied the confirmation prompt
        DialogState::Completed if request.confirmation_status == ConfirmationStatus::Denied => {
            Transition::new(Action::Respond(Envelope::ending())).with_effect(Effect::ClearSession)
        }

        DialogState::Completed => {
            Transition::new(invoke(intent, Phase::IntentCompleted, Fallback::PlainError))
        }

        DialogState::Other(state) => Transition::new(Action::Respond(Envelope::empty()))
            .with_effect(Effect::LogAnomaly {
                message: format!("Dialog state {state:?} should not happen"),
            }),
    }
}
