//! Execution context handed to commands.

use crate::command::{Command, Effect};
use crate::core::{EngineError, EntityId, Payload, Result, State};
use crate::machine::StateMachine;
use crate::snapshot;
use crate::store::{Entity, EntityStore};
use serde_json::Value;
use tracing::{debug, error};

/// Mutable access to the store while a command runs.
///
/// Every mutation made through a session is journaled, so a failing
/// command, sub-command or atomic block can be rolled back exactly. There
/// is deliberately no way to set a state tag directly: state changes go
/// through [`Session::fire`] and the kind's transition table.
pub struct Session<'a, P: Payload, S: State> {
    store: &'a mut EntityStore<P, S>,
    machine: &'a StateMachine<P, S>,
}

impl<'a, P: Payload, S: State> Session<'a, P, S> {
    pub(crate) fn new(store: &'a mut EntityStore<P, S>, machine: &'a StateMachine<P, S>) -> Self {
        Self { store, machine }
    }

    /// Read-only view of the store.
    pub fn store(&self) -> &EntityStore<P, S> {
        self.store
    }

    pub fn machine(&self) -> &StateMachine<P, S> {
        self.machine
    }

    pub fn get(&self, id: EntityId) -> Result<&Entity<P, S>> {
        self.store.get(id)
    }

    /// Fire a trigger through the state machine.
    pub fn fire(&mut self, id: EntityId, trigger: &str, params: &Value) -> Result<S> {
        self.machine.fire(self.store, id, trigger, params)
    }

    pub fn create(&mut self, parent: Option<EntityId>, payload: P, state: S) -> Result<EntityId> {
        self.store.create(parent, payload, state)
    }

    pub fn attach(&mut self, child: EntityId, parent: EntityId) -> Result<()> {
        self.store.attach(child, parent)
    }

    pub fn attach_at(&mut self, child: EntityId, parent: EntityId, index: usize) -> Result<()> {
        self.store.attach_at(child, parent, index)
    }

    pub fn detach(&mut self, id: EntityId) -> Result<()> {
        self.store.detach(id)
    }

    pub fn destroy(&mut self, id: EntityId) -> Result<()> {
        self.store.destroy(id)
    }

    pub fn set_payload(&mut self, id: EntityId, payload: P) -> Result<()> {
        self.store.set_payload(id, payload)
    }

    /// Edit a copy of the payload and write it back. The kind may not change.
    pub fn update<F>(&mut self, id: EntityId, edit: F) -> Result<()>
    where
        F: FnOnce(&mut P),
    {
        let mut payload = self.store.get(id)?.payload().clone();
        edit(&mut payload);
        self.store.set_payload(id, payload)
    }

    /// Run a sub-command as its own reversible unit.
    ///
    /// The sub-command's targets are captured first. If it fails, everything
    /// it changed is rolled back before the error is returned, so the caller
    /// may recover and carry on.
    pub fn apply(&mut self, command: &dyn Command<P, S>) -> Result<Effect<S>> {
        let descriptor = command.descriptor();
        let store = &*self.store;
        let mementos = descriptor
            .targets
            .iter()
            .map(|id| snapshot::capture(store, *id))
            .collect::<Result<Vec<_>>>()?;

        self.store.begin_frame([]);
        for memento in mementos {
            self.store.record_memento(memento);
        }
        debug!(kind = %descriptor.kind, depth = self.store.frame_depth(), "sub-command started");

        match command.execute(self) {
            Ok(effect) => {
                self.store.commit_frame();
                Ok(effect)
            }
            Err(err) => Err(self.rollback_frame(&descriptor.kind, err)),
        }
    }

    /// Run `block` so that either all of its mutations stay or none do.
    pub fn atomic<T, F>(&mut self, block: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.store.begin_frame([]);
        match block(self) {
            Ok(value) => {
                self.store.commit_frame();
                Ok(value)
            }
            Err(err) => Err(self.rollback_frame("atomic", err)),
        }
    }

    fn rollback_frame(&mut self, label: &str, err: EngineError) -> EngineError {
        let rollback = self.store.rollback_frame();
        if let Err(failure) = &rollback {
            error!(label, error = %failure, "rollback failed");
        }
        err.rolled_back(rollback)
    }
}
