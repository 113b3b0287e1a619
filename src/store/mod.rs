//! Entity store: owns every entity, its payload, its state tag and its place
//! in the tree.
//!
//! The store is the leaf component. It enforces the structural invariants
//! (single parent, no cycles, destroy only when detached) and the declared
//! state sets per kind. Every mutation is all-or-nothing: validation runs
//! before anything changes.

mod entity;
pub(crate) mod journal;

pub use entity::Entity;

use crate::core::{EngineError, EntityId, Payload, Result, State};
use crate::machine::TransitionRecord;
use crate::snapshot::Memento;
use journal::{Change, Journal};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Owner of all entities and their declared state sets.
#[derive(Debug)]
pub struct EntityStore<P: Payload, S: State> {
    entities: BTreeMap<EntityId, Entity<P, S>>,
    declared: HashMap<String, Vec<S>>,
    next_id: u64,
    journal: Journal<P, S>,
}

impl<P: Payload, S: State> Default for EntityStore<P, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Payload, S: State> EntityStore<P, S> {
    pub fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            declared: HashMap::new(),
            next_id: 1,
            journal: Journal::default(),
        }
    }

    /// Declare the state set of an entity kind, replacing any previous one.
    pub fn declare(&mut self, kind: impl Into<String>, states: Vec<S>) {
        self.declared.insert(kind.into(), states);
    }

    /// Declared state set of `kind`, if the kind is known.
    pub fn declared_states(&self, kind: &str) -> Option<&[S]> {
        self.declared.get(kind).map(Vec::as_slice)
    }

    /// Check that `state` belongs to the declared set of `kind`.
    pub fn check_declared(&self, kind: &str, state: &S) -> Result<()> {
        let states = self
            .declared
            .get(kind)
            .ok_or_else(|| EngineError::UnknownKind(kind.to_string()))?;
        if states.contains(state) {
            Ok(())
        } else {
            Err(EngineError::UndeclaredState {
                kind: kind.to_string(),
                state: state.name().to_string(),
            })
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, id: EntityId) -> Result<&Entity<P, S>> {
        self.entities.get(&id).ok_or(EngineError::UnknownEntity(id))
    }

    pub fn children_of(&self, id: EntityId) -> Result<&[EntityId]> {
        self.get(id).map(Entity::children)
    }

    pub fn parent_of(&self, id: EntityId) -> Result<Option<EntityId>> {
        self.get(id).map(Entity::parent)
    }

    /// Entities without a parent, in id order.
    pub fn roots(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities
            .values()
            .filter(|e| e.parent.is_none())
            .map(|e| e.id)
    }

    /// All entities in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity<P, S>> + '_ {
        self.entities.values()
    }

    /// Ids of the subtree rooted at `id`, parent before children.
    pub fn descendants(&self, id: EntityId) -> Result<Vec<EntityId>> {
        self.get(id)?;
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            order.push(current);
            if let Some(entity) = self.entities.get(&current) {
                stack.extend(entity.children.iter().rev().copied());
            }
        }
        Ok(order)
    }

    /// Create an entity, optionally appended under `parent`.
    pub fn create(&mut self, parent: Option<EntityId>, payload: P, state: S) -> Result<EntityId> {
        self.check_declared(payload.kind(), &state)?;
        if let Some(parent) = parent {
            self.get(parent)?;
        }

        let id = EntityId::new(self.next_id);
        if self.entities.contains_key(&id) {
            return Err(EngineError::StructuralViolation {
                entity: id,
                reason: "id is already in use".to_string(),
            });
        }
        let from = self.next_id;
        self.next_id += 1;
        self.journal.push(Change::Allocated {
            from,
            to: self.next_id,
        });

        self.entities.insert(
            id,
            Entity {
                id,
                payload,
                state,
                parent: None,
                children: Vec::new(),
            },
        );
        self.journal.first_touch(id);
        self.journal.push(Change::Created(id));

        if let Some(parent) = parent {
            let index = self.entities.get(&parent).map_or(0, |p| p.children.len());
            self.place(id, Some(parent), index)?;
        }

        debug!(entity = %id, ?parent, "entity created");
        Ok(id)
    }

    /// Append `child` to the children of `parent`, moving it if necessary.
    pub fn attach(&mut self, child: EntityId, parent: EntityId) -> Result<()> {
        let index = self.get(parent)?.children.len();
        let index = match self.get(child)?.parent {
            Some(current) if current == parent => index - 1,
            _ => index,
        };
        self.attach_at(child, parent, index)
    }

    /// Insert `child` at `index` among the children of `parent`.
    ///
    /// `index` is interpreted against the child list as it is once `child`
    /// has been taken out of its current place.
    pub fn attach_at(&mut self, child: EntityId, parent: EntityId, index: usize) -> Result<()> {
        self.get(child)?;
        let siblings = self.get(parent)?.children.len();

        if self.is_ancestor_or_self(child, parent) {
            return Err(EngineError::StructuralViolation {
                entity: child,
                reason: format!("attaching under {parent} would make it its own descendant"),
            });
        }

        let available = if self.get(child)?.parent == Some(parent) {
            siblings - 1
        } else {
            siblings
        };
        if index > available {
            return Err(EngineError::StructuralViolation {
                entity: child,
                reason: format!("index {index} out of range for {parent} ({available} children)"),
            });
        }

        self.place(child, Some(parent), index)
    }

    /// Remove `id` (and its subtree) from its parent's child list.
    pub fn detach(&mut self, id: EntityId) -> Result<()> {
        if self.get(id)?.parent.is_none() {
            return Err(EngineError::StructuralViolation {
                entity: id,
                reason: "entity is not attached".to_string(),
            });
        }
        self.place(id, None, 0)
    }

    /// Destroy a detached entity and its whole subtree.
    pub fn destroy(&mut self, id: EntityId) -> Result<()> {
        if let Some(parent) = self.get(id)?.parent {
            return Err(EngineError::StructuralViolation {
                entity: id,
                reason: format!("still attached to {parent}"),
            });
        }
        self.remove_subtree(id)
    }

    /// Replace the payload of `id`. The kind may not change.
    pub fn set_payload(&mut self, id: EntityId, payload: P) -> Result<()> {
        let entity = self.get(id)?;
        if entity.kind() != payload.kind() {
            return Err(EngineError::KindMismatch {
                entity: id,
                expected: entity.kind().to_string(),
                found: payload.kind().to_string(),
            });
        }
        let state = entity.state.clone();
        self.overwrite(id, payload, state)
    }

    /// Set the state tag of `id` directly, bypassing the transition table.
    pub fn set_state(&mut self, id: EntityId, state: S) -> Result<()> {
        let entity = self.get(id)?;
        self.check_declared(entity.kind(), &state)?;
        let payload = entity.payload.clone();
        self.overwrite(id, payload, state)
    }

    pub(crate) fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Swap the whole entity table, used when loading checkpoints.
    pub(crate) fn replace_contents(
        &mut self,
        entities: BTreeMap<EntityId, Entity<P, S>>,
        next_id: u64,
    ) {
        self.entities = entities;
        self.next_id = next_id;
        self.journal = Journal::default();
    }

    /// Write payload and state together, journaling the pre-image.
    pub(crate) fn overwrite(&mut self, id: EntityId, payload: P, state: S) -> Result<()> {
        self.touch(id)?;
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(EngineError::UnknownEntity(id))?;
        entity.payload = payload;
        entity.state = state;
        Ok(())
    }

    /// In-place payload access for exercising deep-copy behavior in tests.
    #[cfg(test)]
    pub(crate) fn payload_mut(&mut self, id: EntityId) -> Result<&mut P> {
        self.touch(id)?;
        self.entities
            .get_mut(&id)
            .map(|e| &mut e.payload)
            .ok_or(EngineError::UnknownEntity(id))
    }

    /// Unjournaled table access, for putting the store out of step in tests.
    #[cfg(test)]
    pub(crate) fn entities_mut(&mut self) -> &mut BTreeMap<EntityId, Entity<P, S>> {
        &mut self.entities
    }

    pub(crate) fn begin_frame(&mut self, guarded: impl IntoIterator<Item = EntityId>) {
        self.journal.begin(guarded);
    }

    /// Record a pre-image held by the caller as part of the current frame.
    pub(crate) fn record_memento(&mut self, memento: Memento<P, S>) {
        self.journal.first_touch(memento.entity());
        self.journal.push(Change::Touched(memento));
    }

    pub(crate) fn commit_frame(&mut self) -> Option<Vec<Change<P, S>>> {
        self.journal.commit()
    }

    /// Close the innermost frame and undo everything it recorded.
    pub(crate) fn rollback_frame(&mut self) -> Result<()> {
        let changes = self.journal.rollback();
        self.revert(changes, false)
    }

    /// Hold a fired transition until the outermost frame commits.
    pub(crate) fn defer_transition(
        &mut self,
        record: TransitionRecord<S>,
    ) -> Option<TransitionRecord<S>> {
        self.journal.defer(record)
    }

    /// Transitions fired in committed frames, once no frame is open.
    pub(crate) fn take_transitions(&mut self) -> Vec<TransitionRecord<S>> {
        self.journal.take_fired()
    }

    pub(crate) fn frame_depth(&self) -> usize {
        self.journal.depth()
    }

    /// Invert `changes`, newest first.
    ///
    /// With `record` set, the inversions are journaled into the current
    /// frame so the reversal itself can be reverted later.
    pub(crate) fn revert(&mut self, changes: Vec<Change<P, S>>, record: bool) -> Result<()> {
        let was_paused = self.journal.set_paused(!record);
        let result = changes
            .into_iter()
            .rev()
            .try_for_each(|change| self.invert(change));
        self.journal.set_paused(was_paused);
        result
    }

    fn invert(&mut self, change: Change<P, S>) -> Result<()> {
        match change {
            Change::Touched(memento) => {
                let (id, payload, state) = memento.into_parts();
                self.overwrite(id, payload, state)
            }
            Change::Created(id) => self.remove_subtree(id),
            Change::Allocated { from, to } => {
                // Ids handed out since then stay reserved.
                if self.next_id == to {
                    self.next_id = from;
                    self.journal.push(Change::Allocated { from: to, to: from });
                }
                Ok(())
            }
            Change::Moved {
                child,
                parent,
                index,
            } => self.place(child, parent, index),
            Change::Removed(entities) => {
                let Some(root) = entities.first().map(|e| e.id) else {
                    return Ok(());
                };
                if let Some(taken) = entities.iter().find(|e| self.entities.contains_key(&e.id)) {
                    return Err(EngineError::StructuralViolation {
                        entity: taken.id,
                        reason: "id was reused while the entity was removed".to_string(),
                    });
                }
                let recording = self.journal.is_recording();
                for entity in entities {
                    if recording {
                        self.journal.first_touch(entity.id);
                    }
                    self.entities.insert(entity.id, entity);
                }
                self.journal.push(Change::Created(root));
                Ok(())
            }
        }
    }

    fn touch(&mut self, id: EntityId) -> Result<()> {
        if !self.journal.is_recording() {
            return Ok(());
        }
        self.get(id)?;
        if self.journal.first_touch(id) {
            let entity = &self.entities[&id];
            let memento = Memento::new(id, entity.payload.clone(), entity.state.clone());
            self.journal.push(Change::Touched(memento));
        }
        Ok(())
    }

    /// Move `child` to `parent` at `index` (or detach it), journaling the old
    /// placement. Callers validate the move first.
    fn place(&mut self, child: EntityId, parent: Option<EntityId>, index: usize) -> Result<()> {
        let old_parent = self.get(child)?.parent;
        let old_index = match old_parent {
            Some(p) => self
                .get(p)?
                .children
                .iter()
                .position(|c| *c == child)
                .unwrap_or(0),
            None => 0,
        };

        if let Some(p) = old_parent {
            if let Some(entity) = self.entities.get_mut(&p) {
                entity.children.retain(|c| *c != child);
            }
        }
        if let Some(p) = parent {
            let siblings = &mut self
                .entities
                .get_mut(&p)
                .ok_or(EngineError::UnknownEntity(p))?
                .children;
            let index = index.min(siblings.len());
            siblings.insert(index, child);
        }
        if let Some(entity) = self.entities.get_mut(&child) {
            entity.parent = parent;
        }

        self.journal.push(Change::Moved {
            child,
            parent: old_parent,
            index: old_index,
        });
        Ok(())
    }

    fn remove_subtree(&mut self, id: EntityId) -> Result<()> {
        let ids = self.descendants(id)?;
        let removed: Vec<_> = ids
            .iter()
            .filter_map(|id| self.entities.remove(id))
            .collect();
        debug!(entity = %id, count = removed.len(), "subtree removed");
        self.journal.push(Change::Removed(removed));
        Ok(())
    }

    fn is_ancestor_or_self(&self, candidate: EntityId, of: EntityId) -> bool {
        let mut current = Some(of);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.entities.get(&id).and_then(|e| e.parent);
        }
        false
    }
}

/// Stores compare equal when they hold identical entities and would
/// allocate the same next id.
impl<P: Payload, S: State> PartialEq for EntityStore<P, S> {
    fn eq(&self, other: &Self) -> bool {
        self.entities == other.entities && self.next_id == other.next_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum Node {
        Folder { name: String },
        File { size: u64 },
    }

    impl Payload for Node {
        fn kind(&self) -> &str {
            match self {
                Self::Folder { .. } => "Folder",
                Self::File { .. } => "File",
            }
        }
    }

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum Status {
        Draft,
        Final,
    }

    impl State for Status {
        fn name(&self) -> &str {
            match self {
                Self::Draft => "Draft",
                Self::Final => "Final",
            }
        }
    }

    fn folder(name: &str) -> Node {
        Node::Folder {
            name: name.to_string(),
        }
    }

    fn store() -> EntityStore<Node, Status> {
        let mut store = EntityStore::new();
        store.declare("Folder", vec![Status::Draft]);
        store.declare("File", vec![Status::Draft, Status::Final]);
        store
    }

    #[test]
    fn create_appends_children_in_order() {
        let mut store = store();
        let root = store.create(None, folder("root"), Status::Draft).unwrap();
        let a = store
            .create(Some(root), Node::File { size: 1 }, Status::Draft)
            .unwrap();
        let b = store
            .create(Some(root), Node::File { size: 2 }, Status::Final)
            .unwrap();

        assert_eq!(store.children_of(root).unwrap(), &[a, b]);
        assert_eq!(store.parent_of(a).unwrap(), Some(root));
        assert_eq!(store.roots().collect::<Vec<_>>(), vec![root]);
    }

    #[test]
    fn create_rejects_undeclared_state() {
        let mut store = store();
        let err = store.create(None, folder("x"), Status::Final).unwrap_err();

        assert!(matches!(err, EngineError::UndeclaredState { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn create_under_missing_parent_fails_cleanly() {
        let mut store = store();
        let root = store.create(None, folder("root"), Status::Draft).unwrap();
        store.destroy(root).unwrap();

        let err = store
            .create(Some(root), folder("orphan"), Status::Draft)
            .unwrap_err();
        assert_eq!(err, EngineError::UnknownEntity(root));
        assert!(store.is_empty());
    }

    #[test]
    fn attach_refuses_cycles_and_leaves_store_unchanged() {
        let mut store = store();
        let a = store.create(None, folder("a"), Status::Draft).unwrap();
        let b = store.create(Some(a), folder("b"), Status::Draft).unwrap();
        let c = store.create(Some(b), folder("c"), Status::Draft).unwrap();
        let before: Vec<_> = store.iter().cloned().collect();

        let err = store.attach(a, c).unwrap_err();
        assert!(matches!(err, EngineError::StructuralViolation { entity, .. } if entity == a));

        let err = store.attach(a, a).unwrap_err();
        assert!(matches!(err, EngineError::StructuralViolation { .. }));

        let after: Vec<_> = store.iter().cloned().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn attach_moves_between_parents() {
        let mut store = store();
        let a = store.create(None, folder("a"), Status::Draft).unwrap();
        let b = store.create(None, folder("b"), Status::Draft).unwrap();
        let f = store
            .create(Some(a), Node::File { size: 3 }, Status::Draft)
            .unwrap();

        store.attach(f, b).unwrap();

        assert!(store.children_of(a).unwrap().is_empty());
        assert_eq!(store.children_of(b).unwrap(), &[f]);
        assert_eq!(store.parent_of(f).unwrap(), Some(b));
    }

    #[test]
    fn attach_at_reorders_siblings() {
        let mut store = store();
        let root = store.create(None, folder("root"), Status::Draft).unwrap();
        let a = store.create(Some(root), folder("a"), Status::Draft).unwrap();
        let b = store.create(Some(root), folder("b"), Status::Draft).unwrap();
        let c = store.create(Some(root), folder("c"), Status::Draft).unwrap();

        store.attach_at(c, root, 0).unwrap();
        assert_eq!(store.children_of(root).unwrap(), &[c, a, b]);

        store.attach(c, root).unwrap();
        assert_eq!(store.children_of(root).unwrap(), &[a, b, c]);

        let err = store.attach_at(a, root, 3).unwrap_err();
        assert!(matches!(err, EngineError::StructuralViolation { .. }));
    }

    #[test]
    fn detach_keeps_subtree_alive() {
        let mut store = store();
        let root = store.create(None, folder("root"), Status::Draft).unwrap();
        let sub = store.create(Some(root), folder("sub"), Status::Draft).unwrap();
        let leaf = store
            .create(Some(sub), Node::File { size: 9 }, Status::Draft)
            .unwrap();

        store.detach(sub).unwrap();

        assert!(store.children_of(root).unwrap().is_empty());
        assert_eq!(store.parent_of(sub).unwrap(), None);
        assert_eq!(store.children_of(sub).unwrap(), &[leaf]);
        assert!(matches!(
            store.detach(sub),
            Err(EngineError::StructuralViolation { .. })
        ));
    }

    #[test]
    fn destroy_requires_detached_entity() {
        let mut store = store();
        let root = store.create(None, folder("root"), Status::Draft).unwrap();
        let sub = store.create(Some(root), folder("sub"), Status::Draft).unwrap();
        let leaf = store
            .create(Some(sub), Node::File { size: 9 }, Status::Draft)
            .unwrap();

        assert!(matches!(
            store.destroy(sub),
            Err(EngineError::StructuralViolation { .. })
        ));

        store.detach(sub).unwrap();
        store.destroy(sub).unwrap();

        assert!(!store.contains(sub));
        assert!(!store.contains(leaf));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn descendants_are_pre_order() {
        let mut store = store();
        let r = store.create(None, folder("r"), Status::Draft).unwrap();
        let a = store.create(Some(r), folder("a"), Status::Draft).unwrap();
        let a1 = store.create(Some(a), folder("a1"), Status::Draft).unwrap();
        let b = store.create(Some(r), folder("b"), Status::Draft).unwrap();

        assert_eq!(store.descendants(r).unwrap(), vec![r, a, a1, b]);
    }

    #[test]
    fn set_payload_rejects_kind_change() {
        let mut store = store();
        let f = store
            .create(None, Node::File { size: 1 }, Status::Draft)
            .unwrap();

        let err = store.set_payload(f, folder("nope")).unwrap_err();
        assert!(matches!(err, EngineError::KindMismatch { .. }));

        store.set_payload(f, Node::File { size: 5 }).unwrap();
        assert_eq!(store.get(f).unwrap().payload(), &Node::File { size: 5 });
    }

    #[test]
    fn journaled_changes_revert_exactly() {
        let mut store = store();
        let root = store.create(None, folder("root"), Status::Draft).unwrap();
        let keep = store
            .create(Some(root), Node::File { size: 1 }, Status::Draft)
            .unwrap();
        let gone = store.create(Some(root), folder("gone"), Status::Draft).unwrap();
        let before = store.iter().cloned().collect::<Vec<_>>();
        let next_before = store.next_id();

        store.begin_frame([]);
        store.set_state(keep, Status::Final).unwrap();
        store.create(Some(root), folder("new"), Status::Draft).unwrap();
        store.detach(gone).unwrap();
        store.destroy(gone).unwrap();
        let changes = store.commit_frame().unwrap();

        store.revert(changes, false).unwrap();

        assert_eq!(store.iter().cloned().collect::<Vec<_>>(), before);
        assert_eq!(store.next_id(), next_before);
    }

    #[test]
    fn rollback_frame_restores_untargeted_entities() {
        let mut store = store();
        let f = store
            .create(None, Node::File { size: 1 }, Status::Draft)
            .unwrap();

        store.begin_frame([]);
        store.set_payload(f, Node::File { size: 100 }).unwrap();
        store.rollback_frame().unwrap();

        assert_eq!(store.get(f).unwrap().payload(), &Node::File { size: 1 });
        assert_eq!(store.frame_depth(), 0);
    }

    #[test]
    fn revert_keeps_ids_allocated_afterwards() {
        let mut store = store();
        let root = store.create(None, folder("root"), Status::Draft).unwrap();

        store.begin_frame([]);
        let spawned = store.create(Some(root), folder("spawned"), Status::Draft).unwrap();
        let changes = store.commit_frame().unwrap();
        let outside = store.create(Some(root), folder("outside"), Status::Draft).unwrap();

        store.revert(changes, false).unwrap();
        let later = store.create(None, folder("later"), Status::Draft).unwrap();

        assert!(!store.contains(spawned));
        assert_ne!(later, outside);
        assert_eq!(store.children_of(root).unwrap(), &[outside]);
        assert_eq!(store.parent_of(outside).unwrap(), Some(root));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn reinsertion_refuses_an_id_in_use() {
        let mut store = store();
        let gone = store.create(None, folder("gone"), Status::Draft).unwrap();

        store.begin_frame([]);
        store.destroy(gone).unwrap();
        let changes = store.commit_frame().unwrap();
        store.replace_contents(BTreeMap::new(), gone.get());
        let squatter = store.create(None, folder("squatter"), Status::Draft).unwrap();
        assert_eq!(squatter, gone);

        let err = store.revert(changes, false).unwrap_err();
        assert!(matches!(err, EngineError::StructuralViolation { entity, .. } if entity == gone));
        assert_eq!(store.get(gone).unwrap().payload(), &folder("squatter"));
    }

    #[test]
    fn rollback_reports_a_journal_out_of_step() {
        let mut store = store();

        store.begin_frame([]);
        let id = store.create(None, folder("tmp"), Status::Draft).unwrap();
        store.entities.remove(&id);

        assert_eq!(store.rollback_frame(), Err(EngineError::UnknownEntity(id)));
    }
}
