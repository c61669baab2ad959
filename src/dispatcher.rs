//! Request dispatcher
//!
//! Records each payload in its session, runs the dialog transition for it,
//! applies the transition's effects and performs its action.

use crate::config::SkillConfig;
use crate::dialog::{transition, Action, DialogContext, Effect, Fallback, Transition};
use crate::error::DispatchError;
use crate::handler::{HandlerRegistry, Phase};
use crate::request::{self, NormalizedRequest};
use crate::response::{Envelope, Reply, ResponseNormalizer};
use crate::session::{SessionRegistry, SessionTurn};
use futures::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Built-in intents answered with a goodbye when no handler is registered
const STOP_INTENTS: &[&str] = &["AMAZON.StopIntent", "AMAZON.CancelIntent"];

/// Built-in intents answered with a follow-up question when no handler is
/// registered. Both spellings are sent by the platform.
const YES_INTENTS: &[&str] = &["yesIntent", "AMAZON.YesIntento"];

/// Entry point for inbound skill payloads
pub struct Dispatcher {
    config: Arc<SkillConfig>,
    sessions: Arc<SessionRegistry>,
    handlers: HandlerRegistry,
    normalizer: ResponseNormalizer,
}

impl Dispatcher {
    pub fn new(config: SkillConfig, handlers: HandlerRegistry) -> Self {
        let config = Arc::new(config);
        Self {
            normalizer: ResponseNormalizer::new(Arc::clone(&config)),
            config,
            sessions: Arc::new(SessionRegistry::new()),
            handlers,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// Handle one raw payload end to end
    pub async fn handle_payload(&self, payload: &Value) -> Reply {
        tracing::info!("New skill request");

        // The session object is missing in AudioPlayer, VideoApp and
        // PlaybackController requests
        let Some(session_id) = request::session_id(payload) else {
            let error = DispatchError::MissingSessionId;
            tracing::warn!(error = %error, kind = error.kind(), "Rejecting request");
            return Reply::bad_request();
        };

        let request = request::normalize(payload, &self.config.devices);
        let turn = self.sessions.record_request(session_id, request).await;
        self.dispatch(&turn).await
    }

    /// Answer the latest request of the session held by `turn`
    pub async fn dispatch(&self, turn: &SessionTurn) -> Reply {
        let request = turn.latest();
        let context = DialogContext {
            launch_handler: &self.config.launch_request_app,
        };
        let Transition { action, effects } = transition(request, &context);

        tracing::info!(
            session_id = %turn.session_id(),
            turn = turn.history().len(),
            request_type = ?request.request_type,
            intent = %request.intent_name,
            dialog_state = ?request.dialog_state,
            "Dispatching request"
        );

        for effect in effects {
            self.apply_effect(effect, turn).await;
        }

        match action {
            Action::Respond(envelope) => Reply::ok(&envelope),
            Action::PlainError => self.normalizer.plain_error(request),
            Action::Invoke {
                handler,
                phase,
                fallback,
            } => {
                let result = self
                    .invoke_handler_phase(&handler, phase, turn, fallback.propagates_errors())
                    .await;
                match result {
                    Ok(reply) => reply,
                    Err(e) => self.fall_back(fallback, &e, request),
                }
            }
        }
    }

    async fn apply_effect(&self, effect: Effect, turn: &SessionTurn) {
        match effect {
            Effect::ClearSession => {
                self.sessions.clear(turn.session_id()).await;
            }
            Effect::LogSessionEnded { error } => {
                tracing::info!(
                    session_id = %turn.session_id(),
                    error = %error,
                    "Platform says session has ended"
                );
            }
            Effect::LogAnomaly { message } => {
                tracing::warn!(session_id = %turn.session_id(), "{message}");
            }
        }
    }

    fn fall_back(
        &self,
        fallback: Fallback,
        error: &DispatchError,
        request: &NormalizedRequest,
    ) -> Reply {
        match fallback {
            Fallback::Delegate => {
                tracing::info!(
                    intent = %request.intent_name,
                    error = %error,
                    kind = error.kind(),
                    "Delegating dialog to platform"
                );
                Reply::ok(&Envelope::delegate())
            }
            Fallback::EmptyEnvelope => {
                tracing::info!(
                    intent = %request.intent_name,
                    error = %error,
                    kind = error.kind(),
                    "Handler could not answer, replying with empty envelope"
                );
                Reply::ok(&Envelope::empty())
            }
            Fallback::PlainError => self.normalizer.plain_error(request),
        }
    }

    /// Invoke `phase` on the handler registered as `name`.
    ///
    /// With `propagate_errors` every failure is returned as an error;
    /// otherwise failures become a spoken error reply. Built-in stop/cancel
    /// and yes intents get canned replies when no handler is registered.
    pub async fn invoke_handler_phase(
        &self,
        name: &str,
        phase: Phase,
        turn: &SessionTurn,
        propagate_errors: bool,
    ) -> Result<Reply, DispatchError> {
        let request = turn.latest();

        let Some(handler) = self.handlers.get(name) else {
            if let Some(reply) = self.builtin_reply(name, turn).await {
                return Ok(reply);
            }
            tracing::warn!(handler = %name, "Handler not found");
            return self.fail(
                DispatchError::HandlerNotFound {
                    name: name.to_string(),
                },
                request,
                propagate_errors,
            );
        };

        if !handler.supports(phase) {
            tracing::warn!(handler = %name, phase = %phase, "Requested phase is not invocable");
            return self.fail(
                DispatchError::PhaseNotSupported {
                    name: name.to_string(),
                    phase,
                },
                request,
                propagate_errors,
            );
        }

        let outcome = AssertUnwindSafe(handler.invoke(phase, request))
            .catch_unwind()
            .await;
        let result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                return self.fail(
                    DispatchError::HandlerRuntimeFailure {
                        name: name.to_string(),
                        message: e.to_string(),
                    },
                    request,
                    propagate_errors,
                );
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(handler = %name, phase = %phase, panic = %message, "Handler panicked");
                return self.fail(
                    DispatchError::HandlerRuntimeFailure {
                        name: name.to_string(),
                        message,
                    },
                    request,
                    propagate_errors,
                );
            }
        };

        match self.normalizer.normalize(name, result, request) {
            Ok(reply) => Ok(reply),
            Err(e) => self.fail(e, request, propagate_errors),
        }
    }

    async fn builtin_reply(&self, name: &str, turn: &SessionTurn) -> Option<Reply> {
        let request = turn.latest();
        if STOP_INTENTS.contains(&name) {
            self.sessions.clear(turn.session_id()).await;
            return Some(self.normalizer.goodbye(request));
        }
        if YES_INTENTS.contains(&name) {
            return Some(self.normalizer.follow_up(request));
        }
        None
    }

    fn fail(
        &self,
        error: DispatchError,
        request: &NormalizedRequest,
        propagate_errors: bool,
    ) -> Result<Reply, DispatchError> {
        if propagate_errors {
            Err(error)
        } else {
            Ok(self.normalizer.plain_error(request))
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
