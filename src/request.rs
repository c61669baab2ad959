//! Inbound payload normalization
//!
//! Turns a raw skill payload into a platform-agnostic [`NormalizedRequest`].
//! Every nested field is optional on the wire; missing or mistyped fields fall
//! back to defaults instead of failing.

use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;

/// Label used when the device id has no configured name
pub const UNKNOWN_DEVICE: &str = "unknown device";

/// Device id used when the payload carries none
const NO_DEVICE_ID: &str = "<no_device_id>";

/// Status code the NLU service uses for a successful entity resolution
const RESOLUTION_SUCCESS: &str = "ER_SUCCESS_MATCH";

/// Kind of inbound request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestType {
    LaunchRequest,
    IntentRequest,
    SessionEndedRequest,
    CanFulfillIntentRequest,
    /// Any other request type, with the raw value kept for logging
    Other(String),
}

impl RequestType {
    fn parse(raw: &str) -> Self {
        match raw {
            "LaunchRequest" => Self::LaunchRequest,
            "IntentRequest" => Self::IntentRequest,
            "SessionEndedRequest" => Self::SessionEndedRequest,
            "CanFulfillIntentRequest" => Self::CanFulfillIntentRequest,
            other => Self::Other(other.to_string()),
        }
    }
}

/// User confirmation outcome for the whole intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmationStatus {
    #[default]
    None,
    Confirmed,
    Denied,
}

impl ConfirmationStatus {
    fn parse(raw: &str) -> Self {
        match raw {
            "CONFIRMED" => Self::Confirmed,
            "DENIED" => Self::Denied,
            _ => Self::None,
        }
    }
}

/// Multi-turn dialog progress reported by the platform
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DialogState {
    /// No dialog state (intent without a dialog model)
    #[default]
    Empty,
    Started,
    InProgress,
    Completed,
    /// A value the platform is not documented to send
    Other(String),
}

impl DialogState {
    fn parse(raw: &str) -> Self {
        match raw {
            "" => Self::Empty,
            "STARTED" => Self::Started,
            "IN_PROGRESS" => Self::InProgress,
            "COMPLETED" => Self::Completed,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A canonical value an entity resolution matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub id: String,
    pub name: String,
}

/// A slot captured from the user's utterance
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Slot {
    pub value: Option<String>,
    /// Successful resolutions, flattened across authorities in payload order
    pub resolutions: Vec<Resolution>,
}

/// Platform-agnostic view of one inbound request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRequest {
    pub request_type: RequestType,
    pub intent_name: String,
    pub confirmation_status: ConfirmationStatus,
    pub dialog_state: DialogState,
    pub device_label: String,
    /// Slots in payload order
    pub slots: IndexMap<String, Slot>,
    pub error_message: String,
}

impl NormalizedRequest {
    /// Raw value of a slot, if the slot exists and carries one
    pub fn slot_value(&self, name: &str) -> Option<&str> {
        self.slots.get(name).and_then(|s| s.value.as_deref())
    }
}

/// Extract `session.sessionId`; an empty id counts as missing
pub fn session_id(payload: &Value) -> Option<&str> {
    payload
        .pointer("/session/sessionId")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
}

/// Build a [`NormalizedRequest`] from a raw payload.
///
/// `devices` maps platform device ids to human readable labels.
pub fn normalize(payload: &Value, devices: &HashMap<String, String>) -> NormalizedRequest {
    let str_at = |pointer: &str| payload.pointer(pointer).and_then(Value::as_str);

    let device_id = str_at("/context/System/device/deviceId").unwrap_or(NO_DEVICE_ID);
    let device_label = if let Some(label) = devices.get(device_id) {
        label.clone()
    } else {
        tracing::info!(device_id = %device_id, "Request from unknown device");
        UNKNOWN_DEVICE.to_string()
    };

    NormalizedRequest {
        request_type: RequestType::parse(str_at("/request/type").unwrap_or_default()),
        intent_name: str_at("/request/intent/name").unwrap_or_default().to_string(),
        confirmation_status: ConfirmationStatus::parse(
            str_at("/request/intent/confirmationStatus").unwrap_or("NONE"),
        ),
        dialog_state: DialogState::parse(str_at("/request/dialogState").unwrap_or_default()),
        device_label,
        slots: payload
            .pointer("/request/intent/slots")
            .map(extract_slots)
            .unwrap_or_default(),
        error_message: str_at("/request/error/message").unwrap_or_default().to_string(),
    }
}

fn extract_slots(slots: &Value) -> IndexMap<String, Slot> {
    let Some(slots) = slots.as_object() else {
        return IndexMap::new();
    };

    slots
        .values()
        .map(|slot| {
            let name = slot
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let value = slot.get("value").and_then(Value::as_str).map(String::from);
            let resolutions = slot
                .pointer("/resolutions/resolutionsPerAuthority")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .map(successful_resolutions)
                .unwrap_or_default();
            (name, Slot { value, resolutions })
        })
        .collect()
}

fn successful_resolutions(authorities: &[Value]) -> Vec<Resolution> {
    authorities
        .iter()
        .filter(|authority| {
            authority.pointer("/status/code").and_then(Value::as_str) == Some(RESOLUTION_SUCCESS)
        })
        .flat_map(|authority| {
            authority
                .get("values")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default()
        })
        .map(|entry| {
            let field = |key: &str| {
                entry
                    .get("value")
                    .and_then(|v| v.get(key))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            Resolution {
                id: field("id"),
                name: field("name"),
            }
        })
        .collect()
}
