//! Checkpoint error types.

use crate::core::EntityId;
use thiserror::Error;

/// Errors that can occur during checkpoint operations
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// Serialization to JSON or binary format failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Deserialization from JSON or binary format failed
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Checkpoint version is not supported by this version
    #[error("Unsupported checkpoint version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// The entity tree in the checkpoint is inconsistent
    #[error("Invalid structure at {entity}: {reason}")]
    InvalidStructure { entity: EntityId, reason: String },

    /// An entity's kind or state is not declared in the target store
    #[error("Entity {entity} has undeclared kind or state: {reason}")]
    Undeclared { entity: EntityId, reason: String },
}
