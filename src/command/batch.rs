//! Macro commands: ordered sub-commands that succeed or fail as one.

use crate::command::{BoxedCommand, Command, Descriptor, Effect, Session};
use crate::core::{EngineError, EntityId, Payload, Result, State};
use serde_json::json;
use tracing::warn;

/// A command made of sub-commands run in order.
///
/// Each step runs as its own unit with its own captured mementos. When step
/// `k` fails, steps `k-1` down to `0` are reverted in strict reverse order
/// and the macro fails with [`EngineError::MacroAborted`], so the store ends
/// up exactly as it was before the macro began.
#[derive(Debug)]
pub struct MacroCommand<P: Payload, S: State> {
    name: String,
    steps: Vec<BoxedCommand<P, S>>,
}

impl<P: Payload, S: State> MacroCommand<P, S> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Append a step.
    pub fn then<C>(mut self, step: C) -> Self
    where
        C: Command<P, S> + 'static,
    {
        self.steps.push(Box::new(step));
        self
    }

    pub fn push(&mut self, step: BoxedCommand<P, S>) {
        self.steps.push(step);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl<P: Payload, S: State> Command<P, S> for MacroCommand<P, S> {
    fn descriptor(&self) -> Descriptor {
        let steps: Vec<Descriptor> = self.steps.iter().map(|s| s.descriptor()).collect();
        let mut targets: Vec<EntityId> = Vec::new();
        for id in steps.iter().flat_map(|d| d.targets.iter()) {
            if !targets.contains(id) {
                targets.push(*id);
            }
        }
        Descriptor::new(
            "macro",
            targets,
            json!({ "name": self.name, "steps": steps }),
        )
    }

    fn execute(&self, session: &mut Session<'_, P, S>) -> Result<Effect<S>> {
        session.atomic(|session| {
            let mut effects = Vec::with_capacity(self.steps.len());
            for (step, command) in self.steps.iter().enumerate() {
                match session.apply(command.as_ref()) {
                    Ok(effect) => effects.push(effect),
                    Err(source) => {
                        warn!(
                            name = %self.name,
                            step,
                            error = %source,
                            "macro step failed, reverting earlier steps"
                        );
                        return Err(EngineError::MacroAborted {
                            name: self.name.clone(),
                            step,
                            source: Box::new(source),
                        });
                    }
                }
            }
            Ok(Effect::Batch(effects))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{BlueprintBuilder, TransitionBuilder};
    use crate::command::{Fire, Spawn};
    use crate::machine::StateMachine;
    use crate::store::EntityStore;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    struct Lamp {
        flips: u32,
    }

    impl Payload for Lamp {
        fn kind(&self) -> &str {
            "Lamp"
        }
    }

    crate::state_enum! {
        enum Power {
            On,
            Off,
        }
    }

    fn fixture() -> (EntityStore<Lamp, Power>, StateMachine<Lamp, Power>, EntityId) {
        let flip = |l: &Lamp, _: &serde_json::Value| -> std::result::Result<Lamp, String> {
            Ok(Lamp { flips: l.flips + 1 })
        };
        let blueprint = BlueprintBuilder::new("Lamp")
            .states(Power::variants())
            .transition(
                TransitionBuilder::new()
                    .from(Power::Off)
                    .on("on")
                    .to(Power::On)
                    .action(flip),
            )
            .unwrap()
            .transition(
                TransitionBuilder::new()
                    .from(Power::On)
                    .on("off")
                    .to(Power::Off)
                    .action(flip),
            )
            .unwrap()
            .build()
            .unwrap();
        let mut store = EntityStore::new();
        store.declare("Lamp", Power::variants());
        let mut machine = StateMachine::new();
        machine.register(blueprint).unwrap();
        let id = store.create(None, Lamp { flips: 0 }, Power::Off).unwrap();
        (store, machine, id)
    }

    #[test]
    fn all_steps_apply_in_order() {
        let (mut store, machine, id) = fixture();
        let command = MacroCommand::new("cycle")
            .then(Fire::new(id, "on"))
            .then(Fire::new(id, "off"))
            .then(Fire::new(id, "on"));

        store.begin_frame([]);
        let effect = command
            .execute(&mut Session::new(&mut store, &machine))
            .unwrap();
        store.commit_frame();

        assert!(matches!(effect, Effect::Batch(ref steps) if steps.len() == 3));
        assert_eq!(store.get(id).unwrap().payload().flips, 3);
        assert_eq!(store.get(id).unwrap().state(), &Power::On);
    }

    #[test]
    fn failing_step_reverts_earlier_steps() {
        let (mut store, machine, id) = fixture();
        let before = store.get(id).unwrap().clone();
        let command = MacroCommand::new("broken")
            .then(Fire::new(id, "on"))
            .then(Spawn::new(Some(id), Lamp { flips: 9 }, Power::On))
            .then(Fire::new(id, "on"));

        store.begin_frame([]);
        let err = command
            .execute(&mut Session::new(&mut store, &machine))
            .unwrap_err();
        store.commit_frame();

        match err {
            EngineError::MacroAborted { name, step, source } => {
                assert_eq!(name, "broken");
                assert_eq!(step, 2);
                assert!(matches!(*source, EngineError::IllegalTransition { .. }));
            }
            other => panic!("expected MacroAborted, got {other:?}"),
        }
        assert_eq!(store.get(id).unwrap(), &before);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn descriptor_merges_step_targets() {
        let (_, _, id) = fixture();
        let other = EntityId::new(42);
        let command: MacroCommand<Lamp, Power> = MacroCommand::new("pair")
            .then(Fire::new(id, "on"))
            .then(Fire::new(other, "on"))
            .then(Fire::new(id, "off"));

        let descriptor = command.descriptor();
        assert_eq!(descriptor.kind, "macro");
        assert_eq!(descriptor.targets, vec![id, other]);
        assert_eq!(descriptor.params["steps"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn empty_macro_succeeds() {
        let (mut store, machine, _) = fixture();
        let command: MacroCommand<Lamp, Power> = MacroCommand::new("noop");
        assert!(command.is_empty());

        let effect = command
            .execute(&mut Session::new(&mut store, &machine))
            .unwrap();
        assert_eq!(effect, Effect::Batch(Vec::new()));
    }
}
