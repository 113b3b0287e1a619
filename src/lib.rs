//! Rewind: reversible commands over a tree of stateful entities
//!
//! Rewind keeps a tree of entities, each with a payload and a state tag
//! drawn from its kind's declared state set. Mutations run as commands
//! that can be undone exactly, state changes go through table-driven
//! transitions, and visitors walk the tree with operations keyed by entity
//! kind.
//!
//! # Core Concepts
//!
//! - **Entity store**: owns every entity and enforces the tree invariants
//! - **Mementos**: deep copies of an entity's payload and state
//! - **Blueprints**: per-kind state sets and transition tables, as data
//! - **Commands and history**: execute, undo, redo, atomic macros
//! - **Visitors**: pre-order traversal with type-keyed dispatch
//!
//! # Example
//!
//! ```rust
//! use rewind::builder::{BlueprintBuilder, TransitionBuilder};
//! use rewind::core::{EngineError, Payload};
//! use rewind::engine::Engine;
//! use rewind::state_enum;
//! use serde::{Deserialize, Serialize};
//! use serde_json::Value;
//!
//! #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
//! struct Counter {
//!     count: u32,
//! }
//!
//! impl Payload for Counter {
//!     fn kind(&self) -> &str {
//!         "Counter"
//!     }
//! }
//!
//! state_enum! {
//!     enum Phase {
//!         Idle,
//!     }
//! }
//!
//! let counter = BlueprintBuilder::new("Counter")
//!     .states(Phase::variants())
//!     .transition(
//!         TransitionBuilder::new()
//!             .from(Phase::Idle)
//!             .on("bump")
//!             .to(Phase::Idle)
//!             .action(|c: &Counter, _: &Value| Ok(Counter { count: c.count + 1 })),
//!     )?
//!     .build()?;
//!
//! let mut engine = Engine::builder().blueprint(counter).build()?;
//! let e = engine.create(None, Counter { count: 0 }, Phase::Idle)?;
//!
//! for _ in 0..3 {
//!     engine.trigger(e, "bump", Value::Null)?;
//! }
//! engine.undo()?;
//! assert_eq!(engine.get(e)?.payload().count, 2);
//! engine.redo()?;
//! assert_eq!(engine.get(e)?.payload().count, 3);
//!
//! for _ in 0..3 {
//!     engine.undo()?;
//! }
//! assert_eq!(engine.undo(), Err(EngineError::NothingToUndo));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod checkpoint;
pub mod command;
pub mod core;
pub mod engine;
pub mod history;
pub mod machine;
pub mod snapshot;
pub mod store;
pub mod traverse;
pub mod validation;

// Re-export commonly used types
pub use builder::{BlueprintBuilder, BuildError, EngineBuilder, TransitionBuilder};
pub use command::{Command, Descriptor, Effect, MacroCommand, Session};
pub use core::{EngineError, EntityId, Guard, Payload, State};
pub use engine::Engine;
pub use history::{HistoryConfig, HistoryManager, RedoStrategy};
pub use machine::{Blueprint, StateMachine};
pub use snapshot::Memento;
pub use store::{Entity, EntityStore};
pub use traverse::{accept, Flow, Visitor};
