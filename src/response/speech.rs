//! Speech text preparation

use crate::request::NormalizedRequest;
use serde_json::{json, Value};

const PAUSE: &str = "<break time='2s'/>";

/// Substitute `{{slot}}` and `{{device}}` placeholders and apply cosmetic
/// replacements: underscores become spaces, `...` becomes a pause.
///
/// Slots without a value substitute the empty string. Unknown placeholders
/// are left alone.
pub fn prepare_speech(text: &str, request: &NormalizedRequest) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut text = text.to_string();
    for name in request.slots.keys() {
        let placeholder = format!("{{{{{name}}}}}");
        text = text.replace(&placeholder, request.slot_value(name).unwrap_or_default());
    }

    text.replace("{{device}}", &request.device_label)
        .replace('_', " ")
        .replace("...", PAUSE)
}

/// SSML `outputSpeech` object for `text`
pub fn ssml_speech(text: &str, request: &NormalizedRequest) -> Value {
    json!({
        "type": "SSML",
        "ssml": format!("<speak>{}</speak>", prepare_speech(text, request)),
    })
}
