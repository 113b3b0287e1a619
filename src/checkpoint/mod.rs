//! Checkpoint and resume for the entity store.
//!
//! A [`Checkpoint`] is a plain serde value holding every entity and the id
//! allocator. Hosts store it however they like; `to_json` and `to_bytes`
//! are conveniences. Transition tables and history are not part of it:
//! blueprints hold closures, and mementos belong to the history that
//! captured them.

use crate::core::{EntityId, Payload, State};
use crate::store::{Entity, EntityStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable image of an entity store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Checkpoint<P: Payload, S: State> {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: String,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    /// Next id the store will allocate
    pub next_id: u64,

    /// Every entity, in id order
    pub entities: Vec<Entity<P, S>>,
}

impl<P: Payload, S: State> Checkpoint<P, S> {
    /// Capture the whole store.
    pub fn of(store: &EntityStore<P, S>) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            next_id: store.next_id(),
            entities: store.iter().cloned().collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        serde_json::from_str(json)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))
    }

    /// Check the checkpoint against a store's declarations without
    /// changing anything.
    pub fn validate(&self, store: &EntityStore<P, S>) -> Result<(), CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }

        let mut by_id = BTreeMap::new();
        for entity in &self.entities {
            let id = entity.id();
            if id.get() == 0 || id.get() >= self.next_id {
                return Err(invalid(id, format!("id outside allocated range 1..{}", self.next_id)));
            }
            if by_id.insert(id, entity).is_some() {
                return Err(invalid(id, "duplicate id"));
            }
            store
                .check_declared(entity.kind(), entity.state())
                .map_err(|e| CheckpointError::Undeclared {
                    entity: id,
                    reason: e.to_string(),
                })?;
        }

        for entity in &self.entities {
            let id = entity.id();
            if let Some(parent) = entity.parent() {
                let listed = by_id
                    .get(&parent)
                    .map(|p| p.children().iter().filter(|c| **c == id).count());
                if listed != Some(1) {
                    return Err(invalid(
                        id,
                        format!("not listed exactly once under parent {parent}"),
                    ));
                }
            }
            let mut seen = HashSet::new();
            for child in entity.children() {
                if !seen.insert(*child) {
                    return Err(invalid(id, format!("child {child} listed twice")));
                }
                match by_id.get(child) {
                    Some(c) if c.parent() == Some(id) => {}
                    _ => {
                        return Err(invalid(
                            id,
                            format!("child {child} does not name it as parent"),
                        ))
                    }
                }
            }
        }

        for entity in &self.entities {
            let mut current = entity.parent();
            let mut steps = 0;
            while let Some(parent) = current {
                steps += 1;
                if steps > self.entities.len() {
                    return Err(invalid(entity.id(), "parent chain contains a cycle"));
                }
                current = by_id.get(&parent).and_then(|p| p.parent());
            }
        }

        Ok(())
    }

    /// Replace the store's contents with this checkpoint after validating it.
    pub fn restore_into(self, store: &mut EntityStore<P, S>) -> Result<(), CheckpointError> {
        self.validate(store)?;
        debug!(
            checkpoint = %self.id,
            entities = self.entities.len(),
            "checkpoint loaded"
        );
        let entities = self.entities.into_iter().map(|e| (e.id(), e)).collect();
        store.replace_contents(entities, self.next_id);
        Ok(())
    }
}

fn invalid(entity: EntityId, reason: impl Into<String>) -> CheckpointError {
    CheckpointError::InvalidStructure {
        entity,
        reason: reason.into(),
    }
}
