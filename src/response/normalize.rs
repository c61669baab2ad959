//! Handler result normalization

use super::{ssml_speech, Envelope, HandlerResult, Reply, ResponseBody, ResponseOverrides};
use crate::config::SkillConfig;
use crate::error::DispatchError;
use crate::request::NormalizedRequest;
use axum::http::StatusCode;
use std::sync::Arc;

const STOP_TOKEN: &str = "stop";
const NEXT_TOKEN: &str = "next";

/// Turns handler results and canned phrases into replies
#[derive(Debug, Clone)]
pub struct ResponseNormalizer {
    config: Arc<SkillConfig>,
}

impl ResponseNormalizer {
    pub fn new(config: Arc<SkillConfig>) -> Self {
        Self { config }
    }

    /// Normalize a result produced by handler `handler`.
    ///
    /// Only `Unrecognized` results (and raw envelopes with an unusable status)
    /// fail; the caller decides whether that becomes a fallback reply.
    pub fn normalize(
        &self,
        handler: &str,
        result: HandlerResult,
        request: &NormalizedRequest,
    ) -> Result<Reply, DispatchError> {
        match result {
            HandlerResult::RawEnvelope { body, status } => match StatusCode::from_u16(status) {
                Ok(status) => Ok(Reply::raw(body, status)),
                Err(_) => Err(unrecognized(handler, format!("invalid status code {status}"))),
            },
            HandlerResult::SpeechWithOverrides { speech, overrides } => {
                let body = overrides_body(ResponseOverrides {
                    output_speech: Some(ssml_speech(&speech, request)),
                    ..overrides
                });
                Ok(Reply::ok(&Envelope::new(body)))
            }
            HandlerResult::SpeechWithControlToken { speech, token } => {
                Ok(self.with_control_token(&speech, &token, request))
            }
            HandlerResult::PlainSpeech(speech) => Ok(Reply::ok(&Envelope::speech(
                ssml_speech(&speech, request),
                false,
            ))),
            HandlerResult::FieldOverrides(overrides) => {
                Ok(Reply::ok(&Envelope::new(overrides_body(overrides))))
            }
            HandlerResult::Unrecognized { reason } => Err(unrecognized(handler, reason)),
        }
    }

    fn with_control_token(&self, lead_in: &str, token: &str, request: &NormalizedRequest) -> Reply {
        let (phrase, should_end_session) = match token {
            STOP_TOKEN => (self.config.goodbye_phrase(), true),
            NEXT_TOKEN => (self.config.next_question_phrase(), false),
            _ => return Reply::ok(&Envelope::speech(ssml_speech(lead_in, request), false)),
        };

        let message = if lead_in.is_empty() {
            phrase
        } else {
            format!("{lead_in}. {phrase}")
        };
        Reply::ok(&Envelope::speech(
            ssml_speech(&message, request),
            should_end_session,
        ))
    }

    /// Spoken error phrase; ends the session
    pub fn plain_error(&self, request: &NormalizedRequest) -> Reply {
        Reply::ok(&Envelope::speech(
            ssml_speech(&self.config.error_phrase(), request),
            true,
        ))
    }

    /// Goodbye phrase for stop/cancel; ends the session
    pub fn goodbye(&self, request: &NormalizedRequest) -> Reply {
        Reply::ok(&Envelope::speech(
            ssml_speech(&self.config.goodbye_phrase(), request),
            true,
        ))
    }

    /// Follow-up question after the user said yes; keeps the session open
    pub fn follow_up(&self, request: &NormalizedRequest) -> Reply {
        Reply::ok(&Envelope::speech(
            ssml_speech(&self.config.question_phrase(), request),
            false,
        ))
    }
}

fn unrecognized(handler: &str, reason: String) -> DispatchError {
    tracing::error!(handler = %handler, reason = %reason, "Handler returned unknown value(s)");
    DispatchError::UnrecognizedHandlerResult {
        name: handler.to_string(),
        reason,
    }
}

fn overrides_body(overrides: ResponseOverrides) -> ResponseBody {
    ResponseBody::default()
        .with_output_speech(overrides.output_speech)
        .with_card(overrides.card)
        .with_reprompt(overrides.reprompt)
        .with_directives(overrides.directives)
        .ending_session(overrides.should_end_session.unwrap_or(false))
}
