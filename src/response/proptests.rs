//! Property-based tests for envelope serialization
//!
//! Empty optional fields must never appear as keys; fields with content must
//! always appear.

use super::*;
use proptest::prelude::*;

fn arb_blank() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        Just(json!({})),
        Just(json!([])),
        Just(json!("")),
    ]
}

fn arb_content() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-zA-Z ]{1,20}".prop_map(|text| json!({"type": "PlainText", "text": text})),
        "[a-z]{1,10}".prop_map(|title| json!({"type": "Simple", "title": title})),
        "[a-z]{1,10}".prop_map(Value::String),
    ]
}

fn arb_field() -> impl Strategy<Value = Option<Value>> {
    prop_oneof![
        Just(None),
        arb_blank().prop_map(Some),
        arb_content().prop_map(Some),
    ]
}

fn arb_directives() -> impl Strategy<Value = Vec<Value>> {
    proptest::collection::vec(
        "[A-Za-z.]{1,20}".prop_map(|kind| json!({ "type": kind })),
        0..3,
    )
}

fn has_content(field: Option<&Value>) -> bool {
    field.is_some_and(is_present)
}

proptest! {
    #[test]
    fn prop_keys_present_iff_content(
        output_speech in arb_field(),
        card in arb_field(),
        reprompt in arb_field(),
        directives in arb_directives(),
        should_end_session in any::<bool>(),
    ) {
        let expected = [
            ("outputSpeech", has_content(output_speech.as_ref())),
            ("card", has_content(card.as_ref())),
            ("reprompt", has_content(reprompt.as_ref())),
            ("directives", !directives.is_empty()),
        ];

        let envelope = Envelope::new(
            ResponseBody::default()
                .with_output_speech(output_speech)
                .with_card(card)
                .with_reprompt(reprompt)
                .with_directives(directives)
                .ending_session(should_end_session),
        );
        let serialized = envelope.to_value();
        let response = serialized["response"].as_object().unwrap();

        for (key, present) in expected {
            prop_assert_eq!(response.contains_key(key), present, "key {}", key);
        }
        prop_assert_eq!(&response["shouldEndSession"], &json!(should_end_session));
        prop_assert_eq!(&serialized["version"], &json!(ENVELOPE_VERSION));
        prop_assert_eq!(&serialized["sessionAttributes"], &json!({}));
    }

    #[test]
    fn prop_speech_results_are_deterministic(text in "[a-zA-Z .]{0,40}") {
        let config = std::sync::Arc::new(crate::config::SkillConfig::default());
        let normalizer = ResponseNormalizer::new(config);
        let request = crate::request::normalize(&json!({}), &std::collections::HashMap::new());

        let first = normalizer
            .normalize("h", HandlerResult::speech(text.clone()), &request)
            .unwrap();
        let second = normalizer
            .normalize("h", HandlerResult::speech(text), &request)
            .unwrap();
        prop_assert_eq!(first, second);
    }
}
