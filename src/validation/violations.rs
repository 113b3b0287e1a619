//! Blueprint violations.

use thiserror::Error;

/// Problems found in a blueprint's state set or transition table
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BlueprintViolation {
    #[error("No states declared")]
    NoStates,

    #[error("State '{state}' declared more than once")]
    DuplicateState { state: String },

    #[error("Trigger '{trigger}' starts from undeclared state '{state}'")]
    UndeclaredSource { trigger: String, state: String },

    #[error("Trigger '{trigger}' leads to undeclared state '{state}'")]
    UndeclaredTarget { trigger: String, state: String },

    #[error("Trigger '{trigger}' defined twice for state '{state}'")]
    DuplicateTrigger { state: String, trigger: String },

    #[error("Empty trigger name on a transition from '{state}'")]
    EmptyTrigger { state: String },
}
