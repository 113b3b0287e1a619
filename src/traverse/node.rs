//! View of the entity currently being visited.

use crate::core::{EntityId, Payload, Result, State};
use crate::store::{Entity, EntityStore};

/// Handle given to visitor operations for one entity.
///
/// It reads anything in the store but only writes the visited entity's
/// payload and state. Tree shape cannot be changed during a walk.
pub struct Node<'a, P: Payload, S: State> {
    store: &'a mut EntityStore<P, S>,
    id: EntityId,
    depth: usize,
}

impl<'a, P: Payload, S: State> Node<'a, P, S> {
    pub(crate) fn new(store: &'a mut EntityStore<P, S>, id: EntityId, depth: usize) -> Self {
        Self { store, id, depth }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Distance from the walk's root, which is at depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn entity(&self) -> Result<&Entity<P, S>> {
        self.store.get(self.id)
    }

    pub fn payload(&self) -> Result<&P> {
        self.entity().map(Entity::payload)
    }

    pub fn state(&self) -> Result<&S> {
        self.entity().map(Entity::state)
    }

    pub fn children(&self) -> Result<&[EntityId]> {
        self.store.children_of(self.id)
    }

    /// Read access to the rest of the store.
    pub fn store(&self) -> &EntityStore<P, S> {
        self.store
    }

    /// Replace the visited entity's payload. The kind may not change.
    pub fn set_payload(&mut self, payload: P) -> Result<()> {
        self.store.set_payload(self.id, payload)
    }

    /// Edit a copy of the visited entity's payload and write it back.
    pub fn update<F>(&mut self, edit: F) -> Result<()>
    where
        F: FnOnce(&mut P),
    {
        let mut payload = self.payload()?.clone();
        edit(&mut payload);
        self.set_payload(payload)
    }

    /// Set the visited entity's state tag. It must be in the kind's
    /// declared set.
    pub fn set_state(&mut self, state: S) -> Result<()> {
        self.store.set_state(self.id, state)
    }
}
