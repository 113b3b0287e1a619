//! Core State trait for entity behavioral states.
//!
//! A state is plain data: a named tag drawn from the declared state set of
//! an entity's kind. Behavior per state lives in the transition table of the
//! kind's blueprint, never on the state value itself.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for entity states.
///
/// All methods are pure. States are immutable values; the engine compares
/// them with `PartialEq` and keys transition tables by [`State::name`], so
/// two distinct states must never share a name.
///
/// # Required Traits
///
/// - `Clone`: states are copied into mementos and transition records
/// - `PartialEq`: membership checks against declared state sets
/// - `Debug`: diagnostics
/// - `Serialize` + `Deserialize`: mementos and checkpoints are serde values
///
/// # Example
///
/// ```rust
/// use rewind::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum DoorState {
///     Open,
///     Closed,
///     Locked,
/// }
///
/// impl State for DoorState {
///     fn name(&self) -> &str {
///         match self {
///             Self::Open => "Open",
///             Self::Closed => "Closed",
///             Self::Locked => "Locked",
///         }
///     }
/// }
///
/// assert_eq!(DoorState::Locked.name(), "Locked");
/// ```
pub trait State:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static
{
    /// Get the state's name for table lookup and logging.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum TestState {
        Idle,
        Running,
        Done,
    }

    impl State for TestState {
        fn name(&self) -> &str {
            match self {
                Self::Idle => "Idle",
                Self::Running => "Running",
                Self::Done => "Done",
            }
        }
    }

    #[test]
    fn state_name_returns_correct_value() {
        assert_eq!(TestState::Idle.name(), "Idle");
        assert_eq!(TestState::Running.name(), "Running");
        assert_eq!(TestState::Done.name(), "Done");
    }

    #[test]
    fn state_serializes_correctly() {
        let state = TestState::Running;
        let json = serde_json::to_string(&state).unwrap();
        let deserialized: TestState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, deserialized);
    }

    #[test]
    fn state_is_comparable() {
        assert_eq!(TestState::Idle, TestState::Idle);
        assert_ne!(TestState::Idle, TestState::Done);
    }
}
