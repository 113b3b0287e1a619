//! Build errors for blueprints, transitions and engines.

use crate::validation::BlueprintViolation;
use thiserror::Error;

/// Errors that can occur when building blueprints, transitions and engines.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Transition source state not specified. Call .from(state)")]
    MissingFromState,

    #[error("Transition trigger not specified. Call .on(trigger)")]
    MissingTrigger,

    #[error("Transition target state not specified. Call .to(state)")]
    MissingToState,

    #[error("Blueprint for kind '{0}' registered twice")]
    DuplicateBlueprint(String),

    #[error("Blueprint '{kind}' is invalid: {} violation(s)", violations.len())]
    InvalidBlueprint {
        kind: String,
        violations: Vec<BlueprintViolation>,
    },

    #[error("History depth must be at least 1")]
    ZeroHistoryDepth,
}
