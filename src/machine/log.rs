//! Transition records handed to observers.

use crate::core::{EntityId, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record of a single successful transition.
///
/// # Example
///
/// ```rust
/// use rewind::core::State;
/// use rewind::machine::TransitionRecord;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum Light {
///     Red,
///     Green,
/// }
///
/// impl State for Light {
///     fn name(&self) -> &str {
///         match self {
///             Self::Red => "Red",
///             Self::Green => "Green",
///         }
///     }
/// }
///
/// fn describe(record: &TransitionRecord<Light>) -> String {
///     format!("{} {} -> {}", record.entity, record.from.name(), record.to.name())
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct TransitionRecord<S: State> {
    /// Entity that transitioned
    pub entity: EntityId,
    /// Trigger that was fired
    pub trigger: String,
    /// The state being transitioned from
    pub from: S,
    /// The state being transitioned to
    pub to: S,
    /// When the transition occurred
    pub timestamp: DateTime<Utc>,
}

impl<S: State> TransitionRecord<S> {
    /// Whether the transition stayed in the same state.
    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

/// Hook called after every successful transition.
pub type TransitionObserver<S> = Box<dyn Fn(&TransitionRecord<S>) + Send + Sync>;
