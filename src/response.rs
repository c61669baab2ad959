//! Response envelope and handler result shapes
//!
//! Handlers answer with one of several [`HandlerResult`] shapes; the
//! [`ResponseNormalizer`] turns each into a canonical [`Envelope`] wrapped in
//! a [`Reply`] with the HTTP status to send back.

mod normalize;
mod speech;

#[cfg(test)]
mod proptests;

pub use normalize::ResponseNormalizer;
pub use speech::ssml_speech;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Envelope format version expected by the voice platform
pub const ENVELOPE_VERSION: &str = "1.0";

// ============================================================================
// Canonical envelope
// ============================================================================

/// The canonical response structure.
///
/// Optional parts of the body that are empty are never serialized; the
/// platform rejects present-but-empty fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub version: String,
    pub session_attributes: Map<String, Value>,
    pub response: ResponseBody,
}

/// The `response` part of an [`Envelope`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_speech: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reprompt: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub directives: Vec<Value>,
    pub should_end_session: bool,
}

impl ResponseBody {
    pub fn with_output_speech(mut self, speech: Option<Value>) -> Self {
        self.output_speech = speech;
        self
    }

    pub fn with_card(mut self, card: Option<Value>) -> Self {
        self.card = card;
        self
    }

    pub fn with_reprompt(mut self, reprompt: Option<Value>) -> Self {
        self.reprompt = reprompt;
        self
    }

    pub fn with_directives(mut self, directives: Vec<Value>) -> Self {
        self.directives = directives;
        self
    }

    pub fn ending_session(mut self, should_end_session: bool) -> Self {
        self.should_end_session = should_end_session;
        self
    }
}

impl Envelope {
    /// Wrap a response body, dropping any optional part that is blank
    pub fn new(mut response: ResponseBody) -> Self {
        response.output_speech = response.output_speech.filter(is_present);
        response.card = response.card.filter(is_present);
        response.reprompt = response.reprompt.filter(is_present);
        Self {
            version: ENVELOPE_VERSION.to_string(),
            session_attributes: Map::new(),
            response,
        }
    }

    /// Bare envelope that keeps the session open
    pub fn empty() -> Self {
        Self::new(ResponseBody::default())
    }

    /// Bare envelope that ends the session
    pub fn ending() -> Self {
        Self::new(ResponseBody::default().ending_session(true))
    }

    /// Spoken envelope
    pub fn speech(output_speech: Value, should_end_session: bool) -> Self {
        Self::new(
            ResponseBody::default()
                .with_output_speech(Some(output_speech))
                .ending_session(should_end_session),
        )
    }

    /// Hand dialog management back to the platform
    pub fn delegate() -> Self {
        Self::new(ResponseBody::default().with_directives(vec![json!({
            "type": "Dialog.Delegate",
            "updatedIntent": null
        })]))
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Null, `{}`, `[]` and `""` count as absent
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::String(s) => !s.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

// ============================================================================
// Reply
// ============================================================================

/// Serialized body plus the HTTP status to answer with
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub body: Value,
    pub status: StatusCode,
}

impl Reply {
    pub fn ok(envelope: &Envelope) -> Self {
        Self {
            body: envelope.to_value(),
            status: StatusCode::OK,
        }
    }

    /// Handler-built body passed through untouched
    pub fn raw(body: Value, status: StatusCode) -> Self {
        Self { body, status }
    }

    /// Structurally invalid request
    pub fn bad_request() -> Self {
        Self {
            body: Value::Object(Map::new()),
            status: StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

// ============================================================================
// Handler results
// ============================================================================

/// Response fields a handler may set or override
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResponseOverrides {
    pub output_speech: Option<Value>,
    pub card: Option<Value>,
    pub reprompt: Option<Value>,
    pub directives: Vec<Value>,
    pub should_end_session: Option<bool>,
}

impl ResponseOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// What a handler phase produced
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerResult {
    /// A complete envelope and status, sent as is
    RawEnvelope { body: Value, status: u16 },
    /// Text to speak plus overrides for the other response fields
    SpeechWithOverrides {
        speech: String,
        overrides: ResponseOverrides,
    },
    /// Optional lead-in text plus a control token (`stop` or `next`)
    SpeechWithControlToken { speech: String, token: String },
    /// Text to speak; the session stays open
    PlainSpeech(String),
    /// Response fields copied into the envelope
    FieldOverrides(ResponseOverrides),
    /// A dynamically-shaped result that matched none of the above
    Unrecognized { reason: String },
}

impl HandlerResult {
    pub fn speech(text: impl Into<String>) -> Self {
        Self::PlainSpeech(text.into())
    }

    /// Speak `text`, then a goodbye phrase, and end the session
    #[allow(dead_code)] // Constructor for code-defined handlers
    pub fn stop(text: impl Into<String>) -> Self {
        Self::SpeechWithControlToken {
            speech: text.into(),
            token: "stop".to_string(),
        }
    }

    /// Speak `text`, then a follow-up question, and keep listening
    pub fn next(text: impl Into<String>) -> Self {
        Self::SpeechWithControlToken {
            speech: text.into(),
            token: "next".to_string(),
        }
    }

    /// Interpret a JSON-shaped result.
    ///
    /// Accepts a string, an object, or a two-element array of
    /// `[object, integer]`, `[string, object]` or `[string, string]`.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(speech) => Self::PlainSpeech(speech),
            Value::Object(fields) => match serde_json::from_value(Value::Object(fields)) {
                Ok(overrides) => Self::FieldOverrides(overrides),
                Err(e) => Self::Unrecognized {
                    reason: format!("invalid response fields: {e}"),
                },
            },
            Value::Array(items) => Self::from_pair(items),
            other => Self::Unrecognized {
                reason: format!("unsupported value: {other}"),
            },
        }
    }

    fn from_pair(items: Vec<Value>) -> Self {
        let len = items.len();
        let Ok([first, second]) = <[Value; 2]>::try_from(items) else {
            return Self::Unrecognized {
                reason: format!("expected 2 values, got {len}"),
            };
        };

        match (first, second) {
            (body @ Value::Object(_), Value::Number(n)) => {
                match n.as_u64().and_then(|n| u16::try_from(n).ok()) {
                    Some(status) => Self::RawEnvelope { body, status },
                    None => Self::Unrecognized {
                        reason: format!("invalid status code: {n}"),
                    },
                }
            }
            (Value::String(speech), Value::Object(fields)) => {
                match serde_json::from_value(Value::Object(fields)) {
                    Ok(overrides) => Self::SpeechWithOverrides { speech, overrides },
                    Err(e) => Self::Unrecognized {
                        reason: format!("invalid response fields: {e}"),
                    },
                }
            }
            (Value::String(speech), Value::String(token)) => {
                Self::SpeechWithControlToken { speech, token }
            }
            _ => Self::Unrecognized {
                reason: "unknown type combination in pair".to_string(),
            },
        }
    }
}
