//! Callback collection flow.
//!
//! A small state machine that gathers the required customer fields (name,
//! phone, location) after a failed-call detection, then signals the caller
//! to create a service task. The stage is an explicit tag rather than being
//! inferred from state presence.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{StateMachine, Timestamp};

use super::customer::{CustomerRecord, RequiredField};
use super::extractor::ExtractedFields;
use super::intent::{FailedCallSignal, Urgency};

/// Lifecycle stage of a callback collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackStage {
    Idle,
    Collecting,
    Complete,
}

impl StateMachine for CallbackStage {
    fn can_transition_to(&self, target: &Self) -> bool {
        use CallbackStage::*;
        matches!(
            (self, target),
            // Idle -> Complete covers same-turn completion when the trigger
            // message already carried every required field.
            (Idle, Collecting) | (Idle, Complete) | (Collecting, Complete)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use CallbackStage::*;
        match self {
            Idle => vec![Collecting, Complete],
            Collecting => vec![Complete],
            Complete => vec![],
        }
    }
}

/// Accumulating state for one callback collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackState {
    pub stage: CallbackStage,
    pub missing_fields: Vec<RequiredField>,
    /// The message that triggered detection, kept for the task record.
    pub trigger_message: String,
    pub trigger_phrase: Option<String>,
    pub customer: CustomerRecord,
    pub urgency: Urgency,
    /// Follow-up prompts issued so far.
    pub attempts: u32,
    pub started_at: Timestamp,
}

impl CallbackState {
    /// Returns true once the state has outlived `max_age_secs`.
    ///
    /// Callback state expires on its own clock, independent of the session
    /// TTL.
    pub fn is_expired(&self, max_age_secs: u64) -> bool {
        self.started_at.age_secs() > max_age_secs
    }
}

/// What the caller must do after a flow step.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackOutcome {
    /// Keep collecting: persist the state and send this prompt.
    Prompt { text: String },
    /// All required fields validated: clear the state, create the service
    /// task, and acknowledge.
    CreateTask {
        customer: CustomerRecord,
        urgency: Urgency,
        trigger_message: String,
    },
}

/// Pure engine for the callback collection flow. Side effects (task
/// creation) are signalled via [`CallbackOutcome`], never performed here.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallbackFlow;

impl CallbackFlow {
    /// Creates the flow engine.
    pub fn new() -> Self {
        Self
    }

    /// Enters the flow from a positive failed-call detection.
    pub fn start(
        &self,
        signal: &FailedCallSignal,
        original_message: &str,
    ) -> (CallbackState, CallbackOutcome) {
        let mut state = CallbackState {
            stage: CallbackStage::Idle,
            missing_fields: signal.missing_fields.clone(),
            trigger_message: original_message.to_string(),
            trigger_phrase: signal.trigger_phrase.clone(),
            customer: signal.customer_data.clone(),
            urgency: signal.urgency,
            attempts: 0,
            started_at: Timestamp::now(),
        };

        if state.missing_fields.is_empty() {
            state.stage = CallbackStage::Complete;
            let outcome = CallbackOutcome::CreateTask {
                customer: state.customer.clone(),
                urgency: state.urgency,
                trigger_message: state.trigger_message.clone(),
            };
            return (state, outcome);
        }

        state.stage = CallbackStage::Collecting;
        let text = format!(
            "Sorry you couldn't reach us on the phone. I can arrange a callback \
             right away — I just need {}.",
            RequiredField::join_labels(&state.missing_fields)
        );
        (state, CallbackOutcome::Prompt { text })
    }

    /// Advances an in-progress collection with freshly extracted fields.
    pub fn advance(
        &self,
        mut state: CallbackState,
        extracted: &ExtractedFields,
    ) -> (CallbackState, CallbackOutcome) {
        state.customer.merge_missing(&extracted.to_record());
        state.missing_fields = state.customer.missing_required();

        if state.missing_fields.is_empty() {
            state.stage = CallbackStage::Complete;
            let outcome = CallbackOutcome::CreateTask {
                customer: state.customer.clone(),
                urgency: state.urgency,
                trigger_message: state.trigger_message.clone(),
            };
            return (state, outcome);
        }

        state.attempts += 1;
        let text = format!(
            "Thanks! I still need {}.",
            RequiredField::join_labels(&state.missing_fields)
        );
        (state, CallbackOutcome::Prompt { text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chat::extractor::ExtractedField;
    use crate::domain::chat::intent::FailedCallDetector;

    fn signal_for(message: &str) -> FailedCallSignal {
        FailedCallDetector::new().detect(message, &[])
    }

    fn fields(name: Option<&str>, phone: Option<&str>, location: Option<&str>) -> ExtractedFields {
        ExtractedFields {
            name: name.map(|v| ExtractedField::new(v, 0.8)),
            phone: phone.map(|v| ExtractedField::new(v, 0.8)),
            location: location.map(|v| ExtractedField::new(v, 0.8)),
            problem: None,
        }
    }

    mod stage_machine {
        use super::*;

        #[test]
        fn idle_can_complete_in_same_turn() {
            assert!(CallbackStage::Idle.can_transition_to(&CallbackStage::Complete));
        }

        #[test]
        fn complete_is_terminal() {
            assert!(CallbackStage::Complete.is_terminal());
        }

        #[test]
        fn collecting_cannot_return_to_idle() {
            assert!(!CallbackStage::Collecting.can_transition_to(&CallbackStage::Idle));
        }
    }

    mod start {
        use super::*;

        #[test]
        fn enters_collecting_when_fields_missing() {
            let signal = signal_for("tried calling since morning, no response");
            let (state, outcome) = CallbackFlow::new().start(&signal, "tried calling");

            assert_eq!(state.stage, CallbackStage::Collecting);
            assert_eq!(state.missing_fields.len(), 3);
            assert_eq!(state.attempts, 0);
            match outcome {
                CallbackOutcome::Prompt { text } => {
                    assert!(text.contains("your name, your phone number, and your location"));
                }
                other => panic!("expected prompt, got {:?}", other),
            }
        }

        #[test]
        fn completes_same_turn_when_nothing_missing() {
            let signal = signal_for(
                "I am Ravi, 9876543210, from Thiruvalla, tried calling but no response",
            );
            assert!(signal.missing_fields.is_empty());

            let (state, outcome) = CallbackFlow::new().start(&signal, "trigger");
            assert_eq!(state.stage, CallbackStage::Complete);
            assert!(matches!(outcome, CallbackOutcome::CreateTask { .. }));
        }

        #[test]
        fn prompt_uses_dual_join_for_two_missing() {
            let signal = signal_for("I am Ravi, tried calling, no response");
            let (_, outcome) = CallbackFlow::new().start(&signal, "trigger");

            match outcome {
                CallbackOutcome::Prompt { text } => {
                    assert!(text.contains("your phone number and your location"));
                    assert!(!text.contains(", and"));
                }
                other => panic!("expected prompt, got {:?}", other),
            }
        }

        #[test]
        fn keeps_trigger_details() {
            let signal = signal_for("tried calling, no response");
            let (state, _) = CallbackFlow::new().start(&signal, "the original text");

            assert_eq!(state.trigger_message, "the original text");
            assert_eq!(state.trigger_phrase.as_deref(), Some("tried calling"));
        }
    }

    mod advance {
        use super::*;

        fn collecting_state() -> CallbackState {
            let signal = signal_for("tried calling, no response");
            CallbackFlow::new().start(&signal, "trigger").0
        }

        #[test]
        fn completes_when_all_fields_arrive() {
            let state = collecting_state();
            let (state, outcome) = CallbackFlow::new().advance(
                state,
                &fields(Some("Ravi"), Some("9876543210"), Some("Thiruvalla")),
            );

            assert_eq!(state.stage, CallbackStage::Complete);
            match outcome {
                CallbackOutcome::CreateTask { customer, .. } => {
                    assert_eq!(customer.name.as_deref(), Some("Ravi"));
                    assert_eq!(customer.phone.as_deref(), Some("9876543210"));
                    assert_eq!(customer.location.as_deref(), Some("Thiruvalla"));
                }
                other => panic!("expected task creation, got {:?}", other),
            }
        }

        #[test]
        fn partial_supply_prompts_for_remainder() {
            let state = collecting_state();
            let (state, outcome) =
                CallbackFlow::new().advance(state, &fields(Some("Ravi"), None, None));

            assert_eq!(state.stage, CallbackStage::Collecting);
            assert_eq!(state.attempts, 1);
            match outcome {
                CallbackOutcome::Prompt { text } => {
                    assert!(text.contains("your phone number and your location"));
                }
                other => panic!("expected prompt, got {:?}", other),
            }
        }

        #[test]
        fn attempts_accumulate_across_turns() {
            let state = collecting_state();
            let flow = CallbackFlow::new();
            let (state, _) = flow.advance(state, &fields(Some("Ravi"), None, None));
            let (state, _) = flow.advance(state, &fields(None, None, None));
            assert_eq!(state.attempts, 2);
        }

        #[test]
        fn later_extraction_never_overwrites_captured_field() {
            let state = collecting_state();
            let flow = CallbackFlow::new();
            let (state, _) = flow.advance(state, &fields(Some("Ravi"), None, None));
            let (state, _) =
                flow.advance(state, &fields(Some("Someone Else"), Some("9876543210"), None));

            assert_eq!(state.customer.name.as_deref(), Some("Ravi"));
        }

        #[test]
        fn invalid_phone_keeps_field_missing() {
            let state = collecting_state();
            let (state, _) = CallbackFlow::new().advance(
                state,
                &fields(Some("Ravi"), Some("12345"), Some("Thiruvalla")),
            );

            assert_eq!(state.stage, CallbackStage::Collecting);
            assert!(state.missing_fields.contains(&RequiredField::Phone));
        }
    }

    mod expiry {
        use super::*;

        #[test]
        fn fresh_state_is_not_expired() {
            let state = collecting_state();
            assert!(!state.is_expired(30 * 60));
        }

        #[test]
        fn old_state_is_expired() {
            let mut state = collecting_state();
            state.started_at = Timestamp::now().minus_minutes(31);
            assert!(state.is_expired(30 * 60));
        }

        fn collecting_state() -> CallbackState {
            let signal = signal_for("tried calling, no response");
            CallbackFlow::new().start(&signal, "trigger").0
        }
    }
}
