//! Accumulating checks for blueprint definitions.
//!
//! Built on Stillwater's `Validation` type: every check runs and every
//! violation is reported in one pass, instead of stopping at the first
//! problem in a transition table.
//!
//! # Example
//!
//! ```rust
//! use rewind::builder::{BlueprintBuilder, BuildError, TransitionBuilder};
//! use rewind::validation::BlueprintViolation;
//! # use rewind::core::{Payload, State};
//! # use serde::{Deserialize, Serialize};
//! # #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
//! # struct Lamp;
//! # impl Payload for Lamp { fn kind(&self) -> &str { "Lamp" } }
//! # #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
//! # enum Power { On, Off, Broken }
//! # impl State for Power {
//! #     fn name(&self) -> &str {
//! #         match self { Self::On => "On", Self::Off => "Off", Self::Broken => "Broken" }
//! #     }
//! # }
//!
//! let result = BlueprintBuilder::<Lamp, Power>::new("Lamp")
//!     .states([Power::On, Power::Off])
//!     .transition(TransitionBuilder::new().from(Power::On).on("break").to(Power::Broken))
//!     .unwrap()
//!     .transition(TransitionBuilder::new().from(Power::Broken).on("fix").to(Power::Off))
//!     .unwrap()
//!     .build();
//!
//! match result {
//!     Err(BuildError::InvalidBlueprint { violations, .. }) => assert_eq!(violations.len(), 2),
//!     _ => panic!("expected an invalid blueprint"),
//! }
//! ```

mod violations;

pub use violations::BlueprintViolation;

use crate::core::{Payload, State};
use crate::machine::TransitionRule;
use std::collections::HashSet;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Check a state set and its rules, accumulating ALL violations.
pub fn check_blueprint<P: Payload, S: State>(
    states: &[S],
    rules: &[TransitionRule<P, S>],
) -> Validation<(), NonEmptyVec<BlueprintViolation>> {
    let mut checks: Vec<Validation<(), NonEmptyVec<BlueprintViolation>>> = Vec::new();

    if states.is_empty() {
        checks.push(Validation::fail(BlueprintViolation::NoStates));
    }

    let mut names = HashSet::new();
    for state in states {
        if !names.insert(state.name()) {
            checks.push(Validation::fail(BlueprintViolation::DuplicateState {
                state: state.name().to_string(),
            }));
        }
    }

    let mut pairs = HashSet::new();
    for rule in rules {
        if rule.trigger.trim().is_empty() {
            checks.push(Validation::fail(BlueprintViolation::EmptyTrigger {
                state: rule.from.name().to_string(),
            }));
        }
        if !states.contains(&rule.from) {
            checks.push(Validation::fail(BlueprintViolation::UndeclaredSource {
                trigger: rule.trigger.clone(),
                state: rule.from.name().to_string(),
            }));
        }
        if !states.contains(&rule.to) {
            checks.push(Validation::fail(BlueprintViolation::UndeclaredTarget {
                trigger: rule.trigger.clone(),
                state: rule.to.name().to_string(),
            }));
        }
        if !pairs.insert((rule.from.name(), rule.trigger.as_str())) {
            checks.push(Validation::fail(BlueprintViolation::DuplicateTrigger {
                state: rule.from.name().to_string(),
                trigger: rule.trigger.clone(),
            }));
        }
    }

    Validation::all_vec(checks).map(|_| ())
}
