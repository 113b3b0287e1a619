//! Builder for constructing engines.

use crate::builder::error::BuildError;
use crate::builder::blueprint::BlueprintBuilder;
use crate::core::{Payload, State};
use crate::engine::Engine;
use crate::history::{HistoryConfig, HistoryManager, RedoStrategy};
use crate::machine::{Blueprint, StateMachine};
use crate::store::EntityStore;

/// Builder for an [`Engine`] with a fluent API.
pub struct EngineBuilder<P: Payload, S: State> {
    blueprints: Vec<Blueprint<P, S>>,
    config: HistoryConfig,
}

impl<P: Payload, S: State> EngineBuilder<P, S> {
    /// Create a new builder with the default history configuration.
    pub fn new() -> Self {
        Self {
            blueprints: Vec::new(),
            config: HistoryConfig::default(),
        }
    }

    /// Add a built blueprint.
    pub fn blueprint(mut self, blueprint: Blueprint<P, S>) -> Self {
        self.blueprints.push(blueprint);
        self
    }

    /// Build a blueprint and add it.
    /// Returns an error if the blueprint fails validation.
    pub fn kind(self, builder: BlueprintBuilder<P, S>) -> Result<Self, BuildError> {
        Ok(self.blueprint(builder.build()?))
    }

    /// Replace the whole history configuration.
    pub fn config(mut self, config: HistoryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    pub fn redo_strategy(mut self, redo: RedoStrategy) -> Self {
        self.config.redo = redo;
        self
    }

    /// Build the engine.
    /// Returns an error for a zero history depth or a kind registered twice.
    pub fn build(self) -> Result<Engine<P, S>, BuildError> {
        let history = HistoryManager::new(self.config)?;
        let mut store = EntityStore::new();
        let mut machine = StateMachine::new();
        for blueprint in self.blueprints {
            store.declare(blueprint.kind(), blueprint.states().to_vec());
            machine.register(blueprint)?;
        }
        Ok(Engine::from_parts(store, machine, history))
    }
}

impl<P: Payload, S: State> Default for EngineBuilder<P, S> {
    fn default() -> Self {
        Self::new()
    }
}
