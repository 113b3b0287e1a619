//! Reversible commands.
//!
//! A command is an immutable description of one operation. The history
//! manager captures a memento of every target the command declares, runs
//! the command against a [`Session`], and keeps the pair so the operation
//! can be undone. Commands never hold live references into the store; they
//! name entities by [`EntityId`](crate::core::EntityId).

mod batch;
mod builtin;
mod session;

pub use batch::MacroCommand;
pub use builtin::{Attach, Destroy, Detach, Fire, SetPayload, Spawn};
pub use session::Session;

use crate::core::{EntityId, Payload, Result, State};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;

/// Host-facing description of a command: enough to log or persist it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    /// Operation kind, e.g. `"fire"` or `"spawn"`
    pub kind: String,
    /// Entities whose payload and state are captured before execution
    pub targets: Vec<EntityId>,
    /// Operation parameters
    pub params: Value,
}

impl Descriptor {
    pub fn new(kind: impl Into<String>, targets: Vec<EntityId>, params: Value) -> Self {
        Self {
            kind: kind.into(),
            targets,
            params,
        }
    }
}

/// What a successful command did.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub enum Effect<S: State> {
    None,
    Created(EntityId),
    Transitioned { entity: EntityId, state: S },
    Updated(EntityId),
    Moved(EntityId),
    Destroyed(EntityId),
    Batch(Vec<Effect<S>>),
}

/// A reversible operation over the entity store.
///
/// `execute` may mutate any entity through the session; mutations of
/// entities missing from [`Descriptor::targets`] are still rolled back, but
/// declaring every entity the command changes keeps history records
/// self-describing.
///
/// Executing the same command twice from the same store contents must
/// produce the same result: redo re-runs `execute`.
pub trait Command<P: Payload, S: State>: Debug + Send + Sync {
    fn descriptor(&self) -> Descriptor;

    fn execute(&self, session: &mut Session<'_, P, S>) -> Result<Effect<S>>;
}

/// Boxed command, as stored by the history manager.
pub type BoxedCommand<P, S> = Box<dyn Command<P, S>>;
