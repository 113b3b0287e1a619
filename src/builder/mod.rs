//! Builder API for blueprints and engines.
//!
//! This module provides fluent builders and macros for declaring entity
//! kinds, their states and transition tables with minimal boilerplate.

pub mod blueprint;
pub mod engine;
pub mod error;
pub mod macros;
pub mod transition;

pub use blueprint::BlueprintBuilder;
pub use engine::EngineBuilder;
pub use error::BuildError;
pub use transition::TransitionBuilder;

use crate::core::{Guard, Payload, State};
use crate::machine::TransitionRule;

/// Create a rule that only advances the state tag.
///
/// # Example
///
/// ```
/// use rewind::builder::simple_transition;
/// use rewind::core::Payload;
/// use rewind::state_enum;
/// # use serde::{Deserialize, Serialize};
/// # #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// # struct Job;
/// # impl Payload for Job { fn kind(&self) -> &str { "Job" } }
///
/// state_enum! {
///     enum Step {
///         Start,
///         End,
///     }
/// }
///
/// let rule = simple_transition::<Job, Step>(Step::Start, "finish", Step::End);
/// assert_eq!(rule.trigger, "finish");
/// ```
pub fn simple_transition<P: Payload, S: State>(
    from: S,
    trigger: impl Into<String>,
    to: S,
) -> TransitionRule<P, S> {
    TransitionRule {
        from,
        trigger: trigger.into(),
        to,
        guard: None,
        action: None,
    }
}

/// Create a state-only rule with a guard on the payload.
pub fn guarded_transition<P, S, F>(
    from: S,
    trigger: impl Into<String>,
    to: S,
    guard: F,
) -> TransitionRule<P, S>
where
    P: Payload,
    S: State,
    F: Fn(&P) -> bool + Send + Sync + 'static,
{
    TransitionRule {
        guard: Some(Guard::new(guard)),
        ..simple_transition(from, trigger, to)
    }
}
