//! State machine engine: table-driven transitions per entity kind.
//!
//! # Key Concepts
//!
//! - **Blueprints**: declared state set plus a transition table per kind
//! - **Rules**: `(state, trigger) -> (guard, action, next state)`
//! - **Firing**: look up the rule, compute the new payload, then write the
//!   payload and the next state together. Nothing changes unless every step
//!   succeeds.

mod blueprint;
mod log;

pub use blueprint::{Action, Blueprint, TransitionRule};
pub use log::{TransitionObserver, TransitionRecord};

use crate::builder::BuildError;
use crate::core::{EngineError, EntityId, Payload, Result, State};
use crate::store::EntityStore;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Registry of blueprints that fires triggers against store entities.
pub struct StateMachine<P: Payload, S: State> {
    blueprints: HashMap<String, Blueprint<P, S>>,
    observers: Vec<TransitionObserver<S>>,
}

impl<P: Payload, S: State> Default for StateMachine<P, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Payload, S: State> StateMachine<P, S> {
    pub fn new() -> Self {
        Self {
            blueprints: HashMap::new(),
            observers: Vec::new(),
        }
    }

    /// Add a blueprint. Each kind may be registered once.
    pub fn register(&mut self, blueprint: Blueprint<P, S>) -> std::result::Result<(), BuildError> {
        if self.blueprints.contains_key(blueprint.kind()) {
            return Err(BuildError::DuplicateBlueprint(blueprint.kind().to_string()));
        }
        self.blueprints.insert(blueprint.kind().to_string(), blueprint);
        Ok(())
    }

    pub fn blueprint(&self, kind: &str) -> Option<&Blueprint<P, S>> {
        self.blueprints.get(kind)
    }

    pub fn blueprints(&self) -> impl Iterator<Item = &Blueprint<P, S>> + '_ {
        self.blueprints.values()
    }

    /// Register a hook called after every successful transition.
    pub fn on_transition<F>(&mut self, observer: F)
    where
        F: Fn(&TransitionRecord<S>) + Send + Sync + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Triggers the entity accepts in its current state (pure).
    pub fn available_triggers(
        &self,
        store: &EntityStore<P, S>,
        id: EntityId,
    ) -> Result<Vec<String>> {
        let entity = store.get(id)?;
        let blueprint = self.blueprint_for(entity.kind())?;
        Ok(blueprint
            .triggers(entity.state())
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    /// Check whether `trigger` would be accepted right now (pure).
    pub fn can_fire(&self, store: &EntityStore<P, S>, id: EntityId, trigger: &str) -> bool {
        let Ok(entity) = store.get(id) else {
            return false;
        };
        self.blueprint(entity.kind())
            .and_then(|bp| bp.rule(entity.state(), trigger))
            .is_some_and(|rule| rule.allows(entity.payload()))
    }

    /// Fire `trigger` on entity `id` and return the state it lands in.
    ///
    /// Fails with `IllegalTransition` when the current state has no rule for
    /// the trigger (always the case in terminal states), `GuardRejected` when
    /// the rule's guard refuses the payload, and `ActionFailed` when the
    /// action errors. In every failure case the entity is unchanged.
    ///
    /// Inside a command, observers hear about the transition only once the
    /// command has committed; a rolled-back transition is never reported.
    pub fn fire(
        &self,
        store: &mut EntityStore<P, S>,
        id: EntityId,
        trigger: &str,
        params: &Value,
    ) -> Result<S> {
        let entity = store.get(id)?;
        let blueprint = self.blueprint_for(entity.kind())?;
        let from = entity.state().clone();

        let rule = blueprint
            .rule(&from, trigger)
            .ok_or_else(|| EngineError::IllegalTransition {
                entity: id,
                state: from.name().to_string(),
                trigger: trigger.to_string(),
            })?;

        if !rule.allows(entity.payload()) {
            return Err(EngineError::GuardRejected {
                entity: id,
                state: from.name().to_string(),
                trigger: trigger.to_string(),
            });
        }

        let next_payload = rule
            .apply(entity.payload(), params)
            .map_err(|reason| EngineError::ActionFailed {
                entity: id,
                trigger: trigger.to_string(),
                reason,
            })?;
        if next_payload.kind() != blueprint.kind() {
            return Err(EngineError::KindMismatch {
                entity: id,
                expected: blueprint.kind().to_string(),
                found: next_payload.kind().to_string(),
            });
        }
        let to = rule.to.clone();

        store.overwrite(id, next_payload, to.clone())?;

        debug!(
            entity = %id,
            trigger,
            from = from.name(),
            to = to.name(),
            "transition fired"
        );
        let record = TransitionRecord {
            entity: id,
            trigger: trigger.to_string(),
            from,
            to: to.clone(),
            timestamp: Utc::now(),
        };
        if let Some(record) = store.defer_transition(record) {
            self.notify(&[record]);
        }

        Ok(to)
    }

    /// Hand committed transitions to every observer, in order.
    pub(crate) fn notify(&self, records: &[TransitionRecord<S>]) {
        for record in records {
            for observer in &self.observers {
                observer(record);
            }
        }
    }

    fn blueprint_for(&self, kind: &str) -> Result<&Blueprint<P, S>> {
        self.blueprints
            .get(kind)
            .ok_or_else(|| EngineError::UnknownKind(kind.to_string()))
    }
}

impl<P: Payload, S: State> fmt::Debug for StateMachine<P, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("kinds", &self.blueprints.keys().collect::<Vec<_>>())
            .field("observers", &self.observers.len())
            .finish()
    }
}
