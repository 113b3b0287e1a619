//! Engine facade: one store, its state machine and its history.

use crate::builder::EngineBuilder;
use crate::checkpoint::{Checkpoint, CheckpointError};
use crate::command::{Command, Descriptor, Effect, Fire};
use crate::core::{EntityId, Payload, Result, State};
use crate::history::{HistoryDepth, HistoryManager};
use crate::machine::{StateMachine, TransitionRecord};
use crate::store::{Entity, EntityStore};
use crate::traverse::{self, Visitor, Walk};
use serde_json::Value;
use tracing::info;

/// An entity store together with the state machine and history that own
/// its mutations.
///
/// Every mutation that should be undoable goes through [`Engine::execute`].
/// Calls run to completion one at a time; wrap the engine in a lock to
/// share it between threads.
#[derive(Debug)]
pub struct Engine<P: Payload, S: State> {
    store: EntityStore<P, S>,
    machine: StateMachine<P, S>,
    history: HistoryManager<P, S>,
}

impl<P: Payload, S: State> Engine<P, S> {
    pub fn builder() -> EngineBuilder<P, S> {
        EngineBuilder::new()
    }

    pub(crate) fn from_parts(
        store: EntityStore<P, S>,
        machine: StateMachine<P, S>,
        history: HistoryManager<P, S>,
    ) -> Self {
        Self {
            store,
            machine,
            history,
        }
    }

    pub fn store(&self) -> &EntityStore<P, S> {
        &self.store
    }

    pub fn machine(&self) -> &StateMachine<P, S> {
        &self.machine
    }

    pub fn history(&self) -> &HistoryManager<P, S> {
        &self.history
    }

    pub fn get(&self, id: EntityId) -> Result<&Entity<P, S>> {
        self.store.get(id)
    }

    /// Create an entity outside of history, e.g. when setting up a document.
    ///
    /// Undoing an earlier command never hands this entity's id out again.
    pub fn create(&mut self, parent: Option<EntityId>, payload: P, state: S) -> Result<EntityId> {
        self.store.create(parent, payload, state)
    }

    /// Execute a command and record it for undo.
    pub fn execute<C>(&mut self, command: C) -> Result<Effect<S>>
    where
        C: Command<P, S> + 'static,
    {
        self.history.execute(&mut self.store, &self.machine, command)
    }

    /// Fire `trigger` on `id` as an undoable command.
    pub fn trigger(&mut self, id: EntityId, trigger: &str, params: Value) -> Result<S> {
        match self.execute(Fire::new(id, trigger).with_params(params))? {
            Effect::Transitioned { state, .. } => Ok(state),
            _ => self.store.get(id).map(|e| e.state().clone()),
        }
    }

    pub fn undo(&mut self) -> Result<Descriptor> {
        self.history.undo(&mut self.store, &self.machine)
    }

    pub fn redo(&mut self) -> Result<Descriptor> {
        self.history.redo(&mut self.store, &self.machine)
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn depth(&self) -> HistoryDepth {
        self.history.depth()
    }

    /// Triggers `id` accepts in its current state.
    pub fn available_triggers(&self, id: EntityId) -> Result<Vec<String>> {
        self.machine.available_triggers(&self.store, id)
    }

    /// Run a visitor over the subtree at `root`. Not recorded in history.
    pub fn accept<A>(&mut self, root: EntityId, visitor: &mut Visitor<P, S, A>) -> Result<Walk> {
        traverse::accept(&mut self.store, root, visitor)
    }

    /// Register a hook called after every successful transition.
    pub fn on_transition<F>(&mut self, observer: F)
    where
        F: Fn(&TransitionRecord<S>) + Send + Sync + 'static,
    {
        self.machine.on_transition(observer);
    }

    pub fn checkpoint(&self) -> Checkpoint<P, S> {
        Checkpoint::of(&self.store)
    }

    /// Replace the store's contents with a checkpoint.
    ///
    /// History refers to entities by id and cannot survive the swap, so it
    /// is cleared. On error nothing changes.
    pub fn load_checkpoint(
        &mut self,
        checkpoint: Checkpoint<P, S>,
    ) -> std::result::Result<(), CheckpointError> {
        let id = checkpoint.id.clone();
        checkpoint.restore_into(&mut self.store)?;
        self.history.clear();
        info!(checkpoint = %id, entities = self.store.len(), "engine resumed from checkpoint");
        Ok(())
    }
}
