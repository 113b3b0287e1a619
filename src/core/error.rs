//! Runtime error taxonomy.

use super::payload::EntityId;
use thiserror::Error;

/// Errors returned by store, snapshot, state machine, history and traversal
/// operations.
///
/// Every failed `execute` leaves the entity store exactly as it was before
/// the command started.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    #[error("Unknown entity {0}")]
    UnknownEntity(EntityId),

    #[error("Unknown entity kind '{0}'")]
    UnknownKind(String),

    #[error("State '{state}' is not declared for kind '{kind}'")]
    UndeclaredState { kind: String, state: String },

    #[error("Structural violation on {entity}: {reason}")]
    StructuralViolation { entity: EntityId, reason: String },

    #[error("Trigger '{trigger}' is not allowed on {entity} in state '{state}'")]
    IllegalTransition {
        entity: EntityId,
        state: String,
        trigger: String,
    },

    #[error("Guard rejected trigger '{trigger}' on {entity} in state '{state}'")]
    GuardRejected {
        entity: EntityId,
        state: String,
        trigger: String,
    },

    #[error("Action for trigger '{trigger}' on {entity} failed: {reason}")]
    ActionFailed {
        entity: EntityId,
        trigger: String,
        reason: String,
    },

    #[error("Payload kind mismatch on {entity}: expected '{expected}', found '{found}'")]
    KindMismatch {
        entity: EntityId,
        expected: String,
        found: String,
    },

    #[error("Corrupt memento for {entity}: {reason}")]
    CorruptMemento { entity: EntityId, reason: String },

    #[error("Visitor '{visitor}' has no operation for entity kind '{kind}'")]
    UnhandledEntityType { visitor: String, kind: String },

    #[error("Visitor '{visitor}' failed: {reason}")]
    VisitorFailed { visitor: String, reason: String },

    #[error("Command '{kind}' failed: {reason}")]
    CommandFailed { kind: String, reason: String },

    #[error("Macro '{name}' aborted at step {step}: {source}")]
    MacroAborted {
        name: String,
        step: usize,
        #[source]
        source: Box<EngineError>,
    },

    #[error("Rolling back after '{cause}' failed, the store may be inconsistent: {failure}")]
    RollbackFailed {
        #[source]
        cause: Box<EngineError>,
        failure: Box<EngineError>,
    },

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,
}

impl EngineError {
    /// Innermost error, looking through nested macro failures.
    pub fn root_cause(&self) -> &EngineError {
        match self {
            Self::MacroAborted { source, .. } => source.root_cause(),
            Self::RollbackFailed { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    /// Attach the outcome of the rollback that followed this error.
    pub(crate) fn rolled_back(self, rollback: Result<(), EngineError>) -> EngineError {
        match rollback {
            Ok(()) => self,
            Err(failure) => Self::RollbackFailed {
                cause: Box::new(self),
                failure: Box::new(failure),
            },
        }
    }
}
