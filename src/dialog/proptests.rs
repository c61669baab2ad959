//! Property-based tests for the dialog state machine
//!
//! These tests verify key invariants hold across all possible requests.

use super::*;
use crate::handler::Phase;
use crate::request::{
    ConfirmationStatus, DialogState, NormalizedRequest, RequestType, Resolution, Slot,
    UNKNOWN_DEVICE,
};
use crate::response::Envelope;
use indexmap::IndexMap;
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_request_type() -> impl Strategy<Value = RequestType> {
    prop_oneof![
        Just(RequestType::LaunchRequest),
        Just(RequestType::IntentRequest),
        Just(RequestType::SessionEndedRequest),
        Just(RequestType::CanFulfillIntentRequest),
        "[A-Za-z.]{0,20}".prop_map(RequestType::Other),
    ]
}

fn arb_dialog_state() -> impl Strategy<Value = DialogState> {
    prop_oneof![
        Just(DialogState::Empty),
        Just(DialogState::Started),
        Just(DialogState::InProgress),
        Just(DialogState::Completed),
        "[A-Z_]{1,12}".prop_map(DialogState::Other),
    ]
}

fn arb_confirmation() -> impl Strategy<Value = ConfirmationStatus> {
    prop_oneof![
        Just(ConfirmationStatus::None),
        Just(ConfirmationStatus::Confirmed),
        Just(ConfirmationStatus::Denied),
    ]
}

fn arb_intent_name() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("AMAZON.StopIntent".to_string()),
        Just("AMAZON.CancelIntent".to_string()),
        Just("yesIntent".to_string()),
        "[A-Za-z]{1,16}",
    ]
}

fn arb_slots() -> impl Strategy<Value = IndexMap<String, Slot>> {
    proptest::collection::vec(
        (
            "[a-z]{1,8}",
            proptest::option::of("[a-z ]{0,10}"),
            proptest::collection::vec(
                ("[A-Z]{1,4}", "[a-z]{1,6}").prop_map(|(id, name)| Resolution { id, name }),
                0..3,
            ),
        )
            .prop_map(|(name, value, resolutions)| (name, Slot { value, resolutions })),
        0..3,
    )
    .prop_map(|slots| slots.into_iter().collect())
}

fn arb_request() -> impl Strategy<Value = NormalizedRequest> {
    (
        arb_request_type(),
        arb_intent_name(),
        arb_confirmation(),
        arb_dialog_state(),
        arb_slots(),
        "[a-z ]{0,20}",
    )
        .prop_map(
            |(request_type, intent_name, confirmation_status, dialog_state, slots, error_message)| {
                NormalizedRequest {
                    request_type,
                    intent_name,
                    confirmation_status,
                    dialog_state,
                    device_label: UNKNOWN_DEVICE.to_string(),
                    slots,
                    error_message,
                }
            },
        )
}

fn arb_intent_request() -> impl Strategy<Value = NormalizedRequest> {
    arb_request().prop_map(|mut request| {
        request.request_type = RequestType::IntentRequest;
        request
    })
}

fn context() -> DialogContext<'static> {
    DialogContext {
        launch_handler: "launcher",
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// The transition is a function of its inputs
    #[test]
    fn prop_transition_is_deterministic(request in arb_request()) {
        prop_assert_eq!(
            transition(&request, &context()),
            transition(&request, &context())
        );
    }

    /// Started/InProgress never clear the session and always fall back to
    /// platform delegation
    #[test]
    fn prop_dialog_in_flight_delegates(request in arb_intent_request()) {
        let result = transition(&request, &context());
        match request.dialog_state {
            DialogState::Started | DialogState::InProgress => {
                prop_assert!(!result.clears_session());
                let is_delegate_invoke = matches!(
                    result.action,
                    Action::Invoke { fallback: Fallback::Delegate, ref handler, .. }
                        if *handler == request.intent_name
                );
                prop_assert!(is_delegate_invoke);
            }
            _ => {
                let is_delegate_invoke = matches!(
                    result.action,
                    Action::Invoke { fallback: Fallback::Delegate, .. }
                );
                prop_assert!(!is_delegate_invoke);
            }
        }
    }

    /// A denied confirmation always ends and clears the session
    #[test]
    fn prop_denied_completion_ends_session(mut request in arb_intent_request()) {
        request.dialog_state = DialogState::Completed;
        request.confirmation_status = ConfirmationStatus::Denied;

        let result = transition(&request, &context());
        prop_assert!(result.clears_session());
        prop_assert_eq!(result.action, Action::Respond(Envelope::ending()));
    }

    /// Unrecognized request types always clear the session with an error
    #[test]
    fn prop_unknown_type_clears(mut request in arb_request(), kind in "[A-Za-z.]{0,20}") {
        request.request_type = RequestType::Other(kind);

        let result = transition(&request, &context());
        prop_assert!(result.clears_session());
        prop_assert_eq!(result.action, Action::PlainError);
    }

    /// Launch always targets the configured launch handler, whatever the intent
    #[test]
    fn prop_launch_uses_launch_handler(mut request in arb_request()) {
        request.request_type = RequestType::LaunchRequest;

        let result = transition(&request, &context());
        prop_assert!(!result.clears_session());
        let targets_launcher = matches!(
            result.action,
            Action::Invoke { ref handler, phase: Phase::LaunchRequest, fallback: Fallback::PlainError }
                if handler == "launcher"
        );
        prop_assert!(targets_launcher);
    }

    /// Only terminal events clear the session
    #[test]
    fn prop_clear_only_on_terminal_events(request in arb_request()) {
        let result = transition(&request, &context());
        let terminal = match &request.request_type {
            RequestType::SessionEndedRequest | RequestType::Other(_) => true,
            RequestType::IntentRequest => {
                request.dialog_state == DialogState::Completed
                    && request.confirmation_status == ConfirmationStatus::Denied
            }
            RequestType::LaunchRequest | RequestType::CanFulfillIntentRequest => false,
        };
        prop_assert_eq!(result.clears_session(), terminal);
    }

    /// Errors are surfaced only where the dispatcher has a non-error fallback
    #[test]
    fn prop_propagation_matches_fallback(request in arb_request()) {
        if let Action::Invoke { phase, fallback, .. } = transition(&request, &context()).action {
            let expected = matches!(
                phase,
                Phase::IntentStarted | Phase::IntentInProgress | Phase::CanFulfill
            );
            prop_assert_eq!(fallback.propagates_errors(), expected);
        }
    }
}
