//! Built-in commands for the common store operations.

use crate::command::{Command, Descriptor, Effect, Session};
use crate::core::{EntityId, Payload, Result, State};
use serde_json::{json, Value};

/// Fire a trigger on one entity.
#[derive(Clone, Debug)]
pub struct Fire {
    pub target: EntityId,
    pub trigger: String,
    pub params: Value,
}

impl Fire {
    pub fn new(target: EntityId, trigger: impl Into<String>) -> Self {
        Self {
            target,
            trigger: trigger.into(),
            params: Value::Null,
        }
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }
}

impl<P: Payload, S: State> Command<P, S> for Fire {
    fn descriptor(&self) -> Descriptor {
        Descriptor::new(
            "fire",
            vec![self.target],
            json!({ "trigger": self.trigger, "params": self.params }),
        )
    }

    fn execute(&self, session: &mut Session<'_, P, S>) -> Result<Effect<S>> {
        let state = session.fire(self.target, &self.trigger, &self.params)?;
        Ok(Effect::Transitioned {
            entity: self.target,
            state,
        })
    }
}

/// Create an entity, optionally under a parent.
#[derive(Clone, Debug)]
pub struct Spawn<P: Payload, S: State> {
    pub parent: Option<EntityId>,
    pub payload: P,
    pub state: S,
}

impl<P: Payload, S: State> Spawn<P, S> {
    pub fn new(parent: Option<EntityId>, payload: P, state: S) -> Self {
        Self {
            parent,
            payload,
            state,
        }
    }
}

impl<P: Payload, S: State> Command<P, S> for Spawn<P, S> {
    fn descriptor(&self) -> Descriptor {
        Descriptor::new(
            "spawn",
            self.parent.into_iter().collect(),
            json!({
                "parent": self.parent,
                "payload": serde_json::to_value(&self.payload).unwrap_or(Value::Null),
                "state": self.state.name(),
            }),
        )
    }

    fn execute(&self, session: &mut Session<'_, P, S>) -> Result<Effect<S>> {
        let id = session.create(self.parent, self.payload.clone(), self.state.clone())?;
        Ok(Effect::Created(id))
    }
}

/// Attach (or move) an entity under a parent.
#[derive(Clone, Debug)]
pub struct Attach {
    pub child: EntityId,
    pub parent: EntityId,
    /// Position among the parent's children; appended when `None`.
    pub index: Option<usize>,
}

impl Attach {
    pub fn new(child: EntityId, parent: EntityId) -> Self {
        Self {
            child,
            parent,
            index: None,
        }
    }

    pub fn at(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }
}

impl<P: Payload, S: State> Command<P, S> for Attach {
    fn descriptor(&self) -> Descriptor {
        Descriptor::new(
            "attach",
            vec![self.child, self.parent],
            json!({ "index": self.index }),
        )
    }

    fn execute(&self, session: &mut Session<'_, P, S>) -> Result<Effect<S>> {
        match self.index {
            Some(index) => session.attach_at(self.child, self.parent, index)?,
            None => session.attach(self.child, self.parent)?,
        }
        Ok(Effect::Moved(self.child))
    }
}

/// Detach an entity's subtree from its parent.
#[derive(Clone, Debug)]
pub struct Detach {
    pub target: EntityId,
}

impl<P: Payload, S: State> Command<P, S> for Detach {
    fn descriptor(&self) -> Descriptor {
        Descriptor::new("detach", vec![self.target], Value::Null)
    }

    fn execute(&self, session: &mut Session<'_, P, S>) -> Result<Effect<S>> {
        session.detach(self.target)?;
        Ok(Effect::Moved(self.target))
    }
}

/// Destroy a detached entity and its subtree.
#[derive(Clone, Debug)]
pub struct Destroy {
    pub target: EntityId,
}

impl<P: Payload, S: State> Command<P, S> for Destroy {
    fn descriptor(&self) -> Descriptor {
        Descriptor::new("destroy", vec![self.target], Value::Null)
    }

    fn execute(&self, session: &mut Session<'_, P, S>) -> Result<Effect<S>> {
        session.destroy(self.target)?;
        Ok(Effect::Destroyed(self.target))
    }
}

/// Replace an entity's payload with one of the same kind.
#[derive(Clone, Debug)]
pub struct SetPayload<P: Payload> {
    pub target: EntityId,
    pub payload: P,
}

impl<P: Payload, S: State> Command<P, S> for SetPayload<P> {
    fn descriptor(&self) -> Descriptor {
        Descriptor::new(
            "set_payload",
            vec![self.target],
            serde_json::to_value(&self.payload).unwrap_or(Value::Null),
        )
    }

    fn execute(&self, session: &mut Session<'_, P, S>) -> Result<Effect<S>> {
        session.set_payload(self.target, self.payload.clone())?;
        Ok(Effect::Updated(self.target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EngineError;
    use crate::machine::StateMachine;
    use crate::store::EntityStore;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum Shape {
        Group,
        Dot { x: i32 },
    }

    impl Payload for Shape {
        fn kind(&self) -> &str {
            match self {
                Self::Group => "Group",
                Self::Dot { .. } => "Dot",
            }
        }
    }

    crate::state_enum! {
        enum Vis {
            Shown,
            Hidden,
        }
    }

    fn store() -> EntityStore<Shape, Vis> {
        let mut store = EntityStore::new();
        store.declare("Group", Vis::variants());
        store.declare("Dot", Vis::variants());
        store
    }

    fn run<C: Command<Shape, Vis>>(
        store: &mut EntityStore<Shape, Vis>,
        command: &C,
    ) -> Result<Effect<Vis>> {
        let machine = StateMachine::new();
        command.execute(&mut Session::new(store, &machine))
    }

    #[test]
    fn spawn_targets_its_parent() {
        let mut store = store();
        let group = store.create(None, Shape::Group, Vis::Shown).unwrap();
        let spawn = Spawn::new(Some(group), Shape::Dot { x: 1 }, Vis::Hidden);

        assert_eq!(Command::<Shape, Vis>::descriptor(&spawn).targets, vec![group]);
        let effect = run(&mut store, &spawn).unwrap();

        let Effect::Created(dot) = effect else {
            panic!("expected a created entity");
        };
        assert_eq!(store.children_of(group).unwrap(), &[dot]);
    }

    #[test]
    fn attach_detach_destroy_sequence() {
        let mut store = store();
        let group = store.create(None, Shape::Group, Vis::Shown).unwrap();
        let a = store.create(Some(group), Shape::Dot { x: 1 }, Vis::Shown).unwrap();
        let b = store.create(None, Shape::Dot { x: 2 }, Vis::Shown).unwrap();

        run(&mut store, &Attach::new(b, group).at(0)).unwrap();
        assert_eq!(store.children_of(group).unwrap(), &[b, a]);

        let err = run(&mut store, &Destroy { target: b }).unwrap_err();
        assert!(matches!(err, EngineError::StructuralViolation { .. }));

        run(&mut store, &Detach { target: b }).unwrap();
        assert_eq!(run(&mut store, &Destroy { target: b }).unwrap(), Effect::Destroyed(b));
        assert!(!store.contains(b));
    }

    #[test]
    fn set_payload_checks_kind() {
        let mut store = store();
        let dot = store.create(None, Shape::Dot { x: 0 }, Vis::Shown).unwrap();

        let err = run(&mut store, &SetPayload { target: dot, payload: Shape::Group }).unwrap_err();
        assert!(matches!(err, EngineError::KindMismatch { .. }));

        run(&mut store, &SetPayload { target: dot, payload: Shape::Dot { x: 7 } }).unwrap();
        assert_eq!(store.get(dot).unwrap().payload(), &Shape::Dot { x: 7 });
    }

    #[test]
    fn fire_without_blueprint_reports_unknown_kind() {
        let mut store = store();
        let dot = store.create(None, Shape::Dot { x: 0 }, Vis::Shown).unwrap();

        let err = run(&mut store, &Fire::new(dot, "hide")).unwrap_err();
        assert_eq!(err, EngineError::UnknownKind("Dot".to_string()));
    }
}
