//! Builder for constructing transition rules.

use crate::builder::error::BuildError;
use crate::core::{Guard, Payload, State};
use crate::machine::{Action, TransitionRule};
use serde_json::Value;
use std::sync::Arc;

/// Builder for constructing transition rules with a fluent API.
pub struct TransitionBuilder<P: Payload, S: State> {
    from: Option<S>,
    trigger: Option<String>,
    to: Option<S>,
    guard: Option<Guard<P>>,
    action: Option<Action<P>>,
}

impl<P: Payload, S: State> TransitionBuilder<P, S> {
    /// Create a new transition builder.
    pub fn new() -> Self {
        Self {
            from: None,
            trigger: None,
            to: None,
            guard: None,
            action: None,
        }
    }

    /// Set the source state (required).
    pub fn from(mut self, state: S) -> Self {
        self.from = Some(state);
        self
    }

    /// Set the trigger name (required).
    pub fn on(mut self, trigger: impl Into<String>) -> Self {
        self.trigger = Some(trigger.into());
        self
    }

    /// Set the target state (required).
    pub fn to(mut self, state: S) -> Self {
        self.to = Some(state);
        self
    }

    /// Add a guard predicate (optional).
    pub fn guard(mut self, guard: Guard<P>) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Add a guard using a closure (optional).
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&P) -> bool + Send + Sync + 'static,
    {
        self.guard = Some(Guard::new(predicate));
        self
    }

    /// Set the payload action (optional). Without one the transition only
    /// advances the state tag.
    pub fn action<F>(mut self, action: F) -> Self
    where
        F: Fn(&P, &Value) -> Result<P, String> + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(action));
        self
    }

    /// Build the transition rule.
    pub fn build(self) -> Result<TransitionRule<P, S>, BuildError> {
        let from = self.from.ok_or(BuildError::MissingFromState)?;
        let trigger = self.trigger.ok_or(BuildError::MissingTrigger)?;
        let to = self.to.ok_or(BuildError::MissingToState)?;

        Ok(TransitionRule {
            from,
            trigger,
            to,
            guard: self.guard,
            action: self.action,
        })
    }
}

impl<P: Payload, S: State> Default for TransitionBuilder<P, S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    struct Meter {
        value: i32,
    }

    impl Payload for Meter {
        fn kind(&self) -> &str {
            "Meter"
        }
    }

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum TestState {
        Idle,
        Active,
    }

    impl State for TestState {
        fn name(&self) -> &str {
            match self {
                Self::Idle => "Idle",
                Self::Active => "Active",
            }
        }
    }

    #[test]
    fn builder_validates_required_fields() {
        let result = TransitionBuilder::<Meter, TestState>::new()
            .from(TestState::Idle)
            .build();
        assert!(matches!(result, Err(BuildError::MissingTrigger)));

        let result = TransitionBuilder::<Meter, TestState>::new()
            .from(TestState::Idle)
            .on("go")
            .build();
        assert!(matches!(result, Err(BuildError::MissingToState)));

        let result = TransitionBuilder::<Meter, TestState>::new()
            .on("go")
            .to(TestState::Active)
            .build();
        assert!(matches!(result, Err(BuildError::MissingFromState)));
    }

    #[test]
    fn transition_builder_with_guard() {
        let rule = TransitionBuilder::new()
            .from(TestState::Idle)
            .on("go")
            .to(TestState::Active)
            .when(|m: &Meter| m.value >= 0)
            .build()
            .unwrap();

        assert!(rule.allows(&Meter { value: 1 }));
        assert!(!rule.allows(&Meter { value: -1 }));
    }

    #[test]
    fn rule_without_action_keeps_payload() {
        let rule = TransitionBuilder::new()
            .from(TestState::Idle)
            .on("go")
            .to(TestState::Active)
            .build()
            .unwrap();

        let payload = Meter { value: 4 };
        assert_eq!(rule.apply(&payload, &Value::Null).unwrap(), payload);
    }

    #[test]
    fn action_receives_params() {
        let rule = TransitionBuilder::new()
            .from(TestState::Idle)
            .on("set")
            .to(TestState::Idle)
            .action(|_: &Meter, params: &Value| {
                params
                    .as_i64()
                    .map(|v| Meter { value: v as i32 })
                    .ok_or_else(|| "expected a number".to_string())
            })
            .build()
            .unwrap();

        let meter = Meter { value: 0 };
        assert_eq!(
            rule.apply(&meter, &Value::from(7)).unwrap(),
            Meter { value: 7 }
        );
        assert!(rule.apply(&meter, &Value::Null).is_err());
    }
}
