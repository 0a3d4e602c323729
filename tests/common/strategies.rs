use proptest::prelude::*;
use tasker_admission::HandlerOutcome;

/// Strategy for generating credentials that satisfy every rule
pub fn valid_credential_strategy() -> impl Strategy<Value = String> {
    "[0-9A-HJ-NPR-Y]{6,32}"
}

/// Strategy for generating arbitrary short ASCII candidates
pub fn any_credential_strategy() -> impl Strategy<Value = String> {
    "[ -~]{0,40}"
}

/// Strategy for generating device identities in textual form
pub fn device_eui_strategy() -> impl Strategy<Value = String> {
    "[0-9a-fA-F]{16}"
}

/// Strategy for generating raw device identity bytes
pub fn device_bytes_strategy() -> impl Strategy<Value = [u8; 8]> {
    any::<[u8; 8]>()
}

pub fn handler_outcome_strategy() -> impl Strategy<Value = HandlerOutcome> {
    prop_oneof![
        Just(HandlerOutcome::Success),
        Just(HandlerOutcome::Failure),
        Just(HandlerOutcome::Retry),
        Just(HandlerOutcome::Pending),
        Just(HandlerOutcome::NoChange),
    ]
}

/// Strategy for generating scripted handler outcomes of bounded length
pub fn outcome_script_strategy() -> impl Strategy<Value = Vec<HandlerOutcome>> {
    prop::collection::vec(handler_outcome_strategy(), 0..8)
}

/// Late activity reports, one per driver pass: resume, fail or nothing
pub fn activity_reports_strategy() -> impl Strategy<Value = Vec<Option<bool>>> {
    prop::collection::vec(prop::option::of(any::<bool>()), 1..12)
}
