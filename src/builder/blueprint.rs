//! Builder for constructing blueprints.

use crate::builder::error::BuildError;
use crate::builder::transition::TransitionBuilder;
use crate::core::{Payload, State};
use crate::machine::{Blueprint, TransitionRule};
use crate::validation::check_blueprint;
use stillwater::validation::Validation;

/// Builder for a kind's declared states and transition table.
pub struct BlueprintBuilder<P: Payload, S: State> {
    kind: String,
    states: Vec<S>,
    rules: Vec<TransitionRule<P, S>>,
}

impl<P: Payload, S: State> BlueprintBuilder<P, S> {
    /// Start a blueprint for the entity kind `kind`.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            states: Vec::new(),
            rules: Vec::new(),
        }
    }

    /// Declare one state.
    pub fn state(mut self, state: S) -> Self {
        self.states.push(state);
        self
    }

    /// Declare several states at once.
    pub fn states(mut self, states: impl IntoIterator<Item = S>) -> Self {
        self.states.extend(states);
        self
    }

    /// Add a transition using a builder.
    /// Returns an error if the builder is missing a required field.
    pub fn transition(mut self, builder: TransitionBuilder<P, S>) -> Result<Self, BuildError> {
        self.rules.push(builder.build()?);
        Ok(self)
    }

    /// Add a pre-built rule.
    pub fn add_rule(mut self, rule: TransitionRule<P, S>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Validate the table and build the blueprint.
    ///
    /// All violations are reported together in `BuildError::InvalidBlueprint`.
    pub fn build(self) -> Result<Blueprint<P, S>, BuildError> {
        match check_blueprint(&self.states, &self.rules) {
            Validation::Success(_) => Ok(Blueprint::from_parts(self.kind, self.states, self.rules)),
            Validation::Failure(errors) => Err(BuildError::InvalidBlueprint {
                kind: self.kind,
                violations: errors.iter().cloned().collect(),
            }),
        }
    }
}
