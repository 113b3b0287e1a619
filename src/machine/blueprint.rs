//! Blueprints: the declared states and transition table of one entity kind.

use crate::core::{Guard, Payload, State};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Pure function from the current payload and trigger parameters to the
/// next payload. An `Err` aborts the transition.
pub type Action<P> = Arc<dyn Fn(&P, &Value) -> Result<P, String> + Send + Sync>;

/// One row of a transition table: `from --trigger--> to`.
pub struct TransitionRule<P: Payload, S: State> {
    pub from: S,
    pub trigger: String,
    pub to: S,
    pub guard: Option<Guard<P>>,
    /// Payload update; `None` advances the state only.
    pub action: Option<Action<P>>,
}

impl<P: Payload, S: State> TransitionRule<P, S> {
    /// Check the guard, if any, against a payload (pure).
    pub fn allows(&self, payload: &P) -> bool {
        self.guard.as_ref().is_none_or(|g| g.check(payload))
    }

    /// Compute the next payload without touching any entity.
    pub fn apply(&self, payload: &P, params: &Value) -> Result<P, String> {
        match &self.action {
            Some(action) => action(payload, params),
            None => Ok(payload.clone()),
        }
    }
}

impl<P: Payload, S: State> Clone for TransitionRule<P, S> {
    fn clone(&self) -> Self {
        Self {
            from: self.from.clone(),
            trigger: self.trigger.clone(),
            to: self.to.clone(),
            guard: self.guard.clone(),
            action: self.action.clone(),
        }
    }
}

impl<P: Payload, S: State> fmt::Debug for TransitionRule<P, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionRule")
            .field("from", &self.from)
            .field("trigger", &self.trigger)
            .field("to", &self.to)
            .field("guarded", &self.guard.is_some())
            .field("has_action", &self.action.is_some())
            .finish()
    }
}

/// Declared state set and transition table of one entity kind.
///
/// States are data: the table is keyed by state name and trigger, so it can
/// be listed, checked for terminal states and serialized by name. Build one
/// with [`BlueprintBuilder`](crate::builder::BlueprintBuilder), which
/// validates the table first.
#[derive(Clone, Debug)]
pub struct Blueprint<P: Payload, S: State> {
    kind: String,
    states: Vec<S>,
    table: HashMap<String, BTreeMap<String, TransitionRule<P, S>>>,
}

impl<P: Payload, S: State> Blueprint<P, S> {
    /// Assemble an already validated blueprint.
    pub(crate) fn from_parts(
        kind: String,
        states: Vec<S>,
        rules: Vec<TransitionRule<P, S>>,
    ) -> Self {
        let mut table: HashMap<String, BTreeMap<String, TransitionRule<P, S>>> = HashMap::new();
        for rule in rules {
            table
                .entry(rule.from.name().to_string())
                .or_default()
                .insert(rule.trigger.clone(), rule);
        }
        Self {
            kind,
            states,
            table,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Declared state set, in declaration order.
    pub fn states(&self) -> &[S] {
        &self.states
    }

    pub fn declares(&self, state: &S) -> bool {
        self.states.contains(state)
    }

    /// Look up the rule for `trigger` in `state`.
    pub fn rule(&self, state: &S, trigger: &str) -> Option<&TransitionRule<P, S>> {
        self.table.get(state.name())?.get(trigger)
    }

    /// Triggers accepted in `state`, sorted by name.
    pub fn triggers(&self, state: &S) -> Vec<&str> {
        self.table
            .get(state.name())
            .map(|rules| rules.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// A state with an empty transition table accepts no trigger at all.
    pub fn is_terminal(&self, state: &S) -> bool {
        self.table.get(state.name()).is_none_or(BTreeMap::is_empty)
    }

    pub fn terminal_states(&self) -> Vec<&S> {
        self.states.iter().filter(|s| self.is_terminal(s)).collect()
    }

    /// Every rule of the table.
    pub fn rules(&self) -> impl Iterator<Item = &TransitionRule<P, S>> + '_ {
        self.table.values().flat_map(BTreeMap::values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{BlueprintBuilder, TransitionBuilder};
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    struct Ticket {
        notes: u32,
    }

    impl Payload for Ticket {
        fn kind(&self) -> &str {
            "Ticket"
        }
    }

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum Phase {
        Open,
        Review,
        Closed,
    }

    impl State for Phase {
        fn name(&self) -> &str {
            match self {
                Self::Open => "Open",
                Self::Review => "Review",
                Self::Closed => "Closed",
            }
        }
    }

    fn blueprint() -> Blueprint<Ticket, Phase> {
        BlueprintBuilder::new("Ticket")
            .states([Phase::Open, Phase::Review, Phase::Closed])
            .transition(
                TransitionBuilder::new()
                    .from(Phase::Open)
                    .on("submit")
                    .to(Phase::Review),
            )
            .unwrap()
            .transition(
                TransitionBuilder::new()
                    .from(Phase::Open)
                    .on("annotate")
                    .to(Phase::Open)
                    .action(|t: &Ticket, _| Ok(Ticket { notes: t.notes + 1 })),
            )
            .unwrap()
            .transition(
                TransitionBuilder::new()
                    .from(Phase::Review)
                    .on("close")
                    .to(Phase::Closed),
            )
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn table_lists_triggers_per_state() {
        let bp = blueprint();

        assert_eq!(bp.triggers(&Phase::Open), vec!["annotate", "submit"]);
        assert_eq!(bp.triggers(&Phase::Review), vec!["close"]);
        assert!(bp.triggers(&Phase::Closed).is_empty());
    }

    #[test]
    fn terminal_states_have_empty_tables() {
        let bp = blueprint();

        assert!(bp.is_terminal(&Phase::Closed));
        assert!(!bp.is_terminal(&Phase::Open));
        assert_eq!(bp.terminal_states(), vec![&Phase::Closed]);
    }

    #[test]
    fn rule_lookup_is_keyed_by_state_and_trigger() {
        let bp = blueprint();

        let rule = bp.rule(&Phase::Open, "submit").unwrap();
        assert_eq!(rule.to, Phase::Review);
        assert!(bp.rule(&Phase::Review, "submit").is_none());
        assert_eq!(bp.rules().count(), 3);
    }

    #[test]
    fn rule_apply_is_pure() {
        let bp = blueprint();
        let rule = bp.rule(&Phase::Open, "annotate").unwrap();
        let before = Ticket { notes: 2 };

        let after = rule.apply(&before, &Value::Null).unwrap();

        assert_eq!(before.notes, 2);
        assert_eq!(after.notes, 3);
    }
}
