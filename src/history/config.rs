//! History configuration.

use crate::builder::BuildError;
use serde::{Deserialize, Serialize};

/// How `redo` brings an undone command back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedoStrategy {
    /// Run the command's operation again. Deterministic as long as the
    /// command and its transition actions are.
    #[default]
    Reexecute,
    /// Journal the undo itself and replay that journal backwards on redo,
    /// restoring the exact post-execution image without running the command.
    PostImage,
}

/// Bounds and behavior of the undo/redo stacks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of undoable records; the oldest is evicted beyond it.
    pub max_depth: usize,
    pub redo: RedoStrategy,
}

impl HistoryConfig {
    pub const DEFAULT_MAX_DEPTH: usize = 100;

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_redo(mut self, redo: RedoStrategy) -> Self {
        self.redo = redo;
        self
    }

    pub fn validate(&self) -> Result<(), BuildError> {
        if self.max_depth == 0 {
            return Err(BuildError::ZeroHistoryDepth);
        }
        Ok(())
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            redo: RedoStrategy::default(),
        }
    }
}
