//! State machine trait for status enums.
//!
//! Provides a consistent interface for validating and performing state
//! transitions across flow lifecycle statuses (bulk order steps, callback
//! collection stages).

use super::ValidationError;

/// Trait for status enums that represent state machines.
///
/// Implementors define valid state transitions and get validated
/// transition methods for free.
///
/// # Example
///
/// ```ignore
/// impl StateMachine for BulkOrderStep {
///     fn can_transition_to(&self, target: &Self) -> bool {
///         matches!(
///             (self, target),
///             (Initial, CollectingContact) |
///             (CollectingContact, Confirming) |
///             (Confirming, Complete) |
///             (Confirming, Initial) // explicit cancellation
///         )
///     }
///
///     fn valid_transitions(&self) -> Vec<Self> {
///         match self {
///             Initial => vec![CollectingContact],
///             // ... etc
///         }
///     }
/// }
///
/// let step = step.transition_to(BulkOrderStep::Confirming)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    ///
    /// This is the preferred way to change state, as it ensures
    /// the transition is valid according to the state machine rules.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimal flow-like enum exercising the trait contract.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TestStage {
        Open,
        Gathering,
        Done,
    }

    impl StateMachine for TestStage {
        fn can_transition_to(&self, target: &Self) -> bool {
            use TestStage::*;
            matches!((self, target), (Open, Gathering) | (Gathering, Done))
        }

        fn valid_transitions(&self) -> Vec<Self> {
            use TestStage::*;
            match self {
                Open => vec![Gathering],
                Gathering => vec![Done],
                Done => vec![],
            }
        }
    }

    #[test]
    fn transition_to_succeeds_for_valid_transition() {
        let stage = TestStage::Open;
        assert_eq!(stage.transition_to(TestStage::Gathering), Ok(TestStage::Gathering));
    }

    #[test]
    fn transition_to_fails_for_invalid_transition() {
        let stage = TestStage::Open;
        assert!(stage.transition_to(TestStage::Done).is_err());
    }

    #[test]
    fn terminal_state_has_no_transitions() {
        assert!(TestStage::Done.is_terminal());
        assert!(!TestStage::Open.is_terminal());
    }

    #[test]
    fn can_transition_to_is_consistent_with_valid_transitions() {
        for stage in [TestStage::Open, TestStage::Gathering, TestStage::Done] {
            for target in stage.valid_transitions() {
                assert!(
                    stage.can_transition_to(&target),
                    "can_transition_to should allow {:?} -> {:?}",
                    stage,
                    target
                );
            }
        }
    }
}
