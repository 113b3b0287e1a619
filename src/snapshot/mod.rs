//! Snapshot engine: opaque captures of one entity's restorable state.
//!
//! A [`Memento`] is a deep copy of an entity's payload and state tag. Holders
//! such as the history manager store and hand mementos back, but only this
//! module and the store read their contents. Mementos serialize with serde
//! so a host can persist them; the engine defines no format of its own.

use crate::core::{EngineError, EntityId, Payload, Result, State};
use crate::store::EntityStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Immutable capture of one entity's payload and state tag.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Memento<P: Payload, S: State> {
    entity: EntityId,
    payload: P,
    state: S,
    captured_at: DateTime<Utc>,
}

impl<P: Payload, S: State> Memento<P, S> {
    pub(crate) fn new(entity: EntityId, payload: P, state: S) -> Self {
        Self {
            entity,
            payload,
            state,
            captured_at: Utc::now(),
        }
    }

    /// Entity the memento was captured from.
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// When the memento was captured.
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub(crate) fn into_parts(self) -> (EntityId, P, S) {
        (self.entity, self.payload, self.state)
    }
}

/// Capture a deep, independent copy of an entity's payload and state.
pub fn capture<P: Payload, S: State>(
    store: &EntityStore<P, S>,
    id: EntityId,
) -> Result<Memento<P, S>> {
    let entity = store.get(id)?;
    Ok(Memento::new(id, entity.payload().clone(), entity.state().clone()))
}

/// Overwrite an entity's payload and state with a memento's contents.
///
/// Restoration is a rollback, not a transition, so the transition table is
/// not consulted. The memento must still belong to `id`, carry a payload of
/// the entity's kind and a state from the kind's declared set; otherwise the
/// entity is left untouched and `CorruptMemento` is returned.
pub fn restore<P: Payload, S: State>(
    store: &mut EntityStore<P, S>,
    id: EntityId,
    memento: &Memento<P, S>,
) -> Result<()> {
    let entity = store.get(id)?;

    if memento.entity != id {
        return Err(EngineError::CorruptMemento {
            entity: id,
            reason: format!("memento was captured from {}", memento.entity),
        });
    }
    if memento.payload.kind() != entity.kind() {
        return Err(EngineError::CorruptMemento {
            entity: id,
            reason: format!(
                "payload kind '{}' does not match entity kind '{}'",
                memento.payload.kind(),
                entity.kind()
            ),
        });
    }
    if store.check_declared(entity.kind(), &memento.state).is_err() {
        return Err(EngineError::CorruptMemento {
            entity: id,
            reason: format!(
                "state '{}' is not declared for kind '{}'",
                memento.state.name(),
                entity.kind()
            ),
        });
    }

    debug!(entity = %id, state = memento.state.name(), "memento restored");
    store.overwrite(id, memento.payload.clone(), memento.state.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum Doc {
        Page { lines: Vec<String> },
        Image { width: u32 },
    }

    impl Payload for Doc {
        fn kind(&self) -> &str {
            match self {
                Self::Page { .. } => "Page",
                Self::Image { .. } => "Image",
            }
        }
    }

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum Review {
        Open,
        Approved,
        Archived,
    }

    impl State for Review {
        fn name(&self) -> &str {
            match self {
                Self::Open => "Open",
                Self::Approved => "Approved",
                Self::Archived => "Archived",
            }
        }
    }

    fn store() -> EntityStore<Doc, Review> {
        let mut store = EntityStore::new();
        store.declare("Page", vec![Review::Open, Review::Approved]);
        store.declare("Image", vec![Review::Open]);
        store
    }

    fn page(lines: &[&str]) -> Doc {
        Doc::Page {
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }

    #[test]
    fn capture_is_independent_of_later_mutation() {
        let mut store = store();
        let id = store.create(None, page(&["a", "b"]), Review::Open).unwrap();
        let memento = capture(&store, id).unwrap();

        store.set_payload(id, page(&["changed"])).unwrap();
        store.set_state(id, Review::Approved).unwrap();

        restore(&mut store, id, &memento).unwrap();
        let entity = store.get(id).unwrap();
        assert_eq!(entity.payload(), &page(&["a", "b"]));
        assert_eq!(entity.state(), &Review::Open);
    }

    #[test]
    fn memento_survives_in_place_mutation_of_nested_data() {
        let mut store = store();
        let id = store.create(None, page(&["keep"]), Review::Open).unwrap();
        let memento = capture(&store, id).unwrap();

        if let Doc::Page { lines } = store.payload_mut(id).unwrap() {
            lines.push("appended".to_string());
            lines[0].push_str("-edited");
        }

        restore(&mut store, id, &memento).unwrap();
        assert_eq!(store.get(id).unwrap().payload(), &page(&["keep"]));
    }

    #[test]
    fn capture_unknown_entity_fails() {
        let mut store = store();
        let id = store.create(None, page(&[]), Review::Open).unwrap();
        store.destroy(id).unwrap();

        assert_eq!(
            capture(&store, id).unwrap_err(),
            EngineError::UnknownEntity(id)
        );
    }

    #[test]
    fn restore_rejects_undeclared_state() {
        let mut store = store();
        let id = store.create(None, page(&[]), Review::Open).unwrap();
        let forged = Memento::new(id, page(&["x"]), Review::Archived);

        let err = restore(&mut store, id, &forged).unwrap_err();
        assert!(matches!(err, EngineError::CorruptMemento { .. }));
        assert_eq!(store.get(id).unwrap().payload(), &page(&[]));
    }

    #[test]
    fn restore_rejects_foreign_memento() {
        let mut store = store();
        let a = store.create(None, page(&["a"]), Review::Open).unwrap();
        let b = store.create(None, page(&["b"]), Review::Open).unwrap();
        let memento = capture(&store, a).unwrap();

        let err = restore(&mut store, b, &memento).unwrap_err();
        assert!(matches!(err, EngineError::CorruptMemento { entity, .. } if entity == b));
    }

    #[test]
    fn restore_rejects_kind_change() {
        let mut store = store();
        let id = store.create(None, page(&[]), Review::Open).unwrap();
        let forged = Memento::new(id, Doc::Image { width: 3 }, Review::Open);

        let err = restore(&mut store, id, &forged).unwrap_err();
        assert!(matches!(err, EngineError::CorruptMemento { .. }));
    }

    #[test]
    fn memento_serializes_for_hosts() {
        let mut store = store();
        let id = store.create(None, page(&["x"]), Review::Open).unwrap();
        let memento = capture(&store, id).unwrap();

        let json = serde_json::to_string(&memento).unwrap();
        let back: Memento<Doc, Review> = serde_json::from_str(&json).unwrap();

        store.set_payload(id, page(&[])).unwrap();
        restore(&mut store, id, &back).unwrap();
        assert_eq!(store.get(id).unwrap().payload(), &page(&["x"]));
    }
}
