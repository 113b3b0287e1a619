//! Core types shared by every component.
//!
//! This module contains the vocabulary the rest of the engine is written in:
//! - State definitions via the `State` trait
//! - Entity payloads via the `Payload` trait and `EntityId`
//! - Guard predicates over payloads
//! - The `EngineError` taxonomy

mod error;
mod guard;
mod payload;
mod state;

pub use error::EngineError;
pub use guard::Guard;
pub use payload::{EntityId, Payload};
pub use state::State;

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, EngineError>;
