//! Entity nodes held by the store.

use crate::core::{EntityId, Payload, State};
use serde::{Deserialize, Serialize};

/// A node in the entity tree.
///
/// Entities are owned by the [`EntityStore`](super::EntityStore); callers
/// only ever see shared references, so every mutation goes through the
/// store where it can be journaled and validated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Entity<P: Payload, S: State> {
    pub(crate) id: EntityId,
    pub(crate) payload: P,
    pub(crate) state: S,
    pub(crate) parent: Option<EntityId>,
    pub(crate) children: Vec<EntityId>,
}

impl<P: Payload, S: State> Entity<P, S> {
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    /// Kind of the entity, as reported by its payload.
    pub fn kind(&self) -> &str {
        self.payload.kind()
    }

    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    /// Ordered child identifiers.
    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    /// Whether the entity currently hangs under a parent.
    pub fn is_attached(&self) -> bool {
        self.parent.is_some()
    }
}
