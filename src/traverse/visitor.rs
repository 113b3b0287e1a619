//! Type-keyed visitor operations.

use crate::core::{Payload, Result, State};
use crate::traverse::{Flow, Node};
use std::collections::HashMap;
use std::fmt;

/// Operation run for one entity kind.
pub type Handler<P, S, A> = Box<dyn FnMut(&mut A, &mut Node<'_, P, S>) -> Result<Flow>>;

/// A named set of operations keyed by entity kind, with its own
/// accumulator.
///
/// # Example
///
/// ```rust
/// use rewind::traverse::{Flow, Node, Visitor};
/// # use rewind::core::{Payload, State};
/// # use serde::{Deserialize, Serialize};
/// # #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// # struct Leaf { value: i64 }
/// # impl Payload for Leaf { fn kind(&self) -> &str { "Leaf" } }
/// # #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// # struct Fresh;
/// # impl State for Fresh { fn name(&self) -> &str { "Fresh" } }
///
/// let visitor: Visitor<Leaf, Fresh, i64> = Visitor::new("sum", 0).on("Leaf", |total: &mut i64, node: &mut Node<'_, Leaf, Fresh>| {
///     *total += node.payload()?.value;
///     Ok(Flow::Continue)
/// });
/// assert!(visitor.handles("Leaf"));
/// assert!(!visitor.handles("Branch"));
/// ```
pub struct Visitor<P: Payload, S: State, A> {
    name: String,
    handlers: HashMap<String, Handler<P, S, A>>,
    acc: A,
}

impl<P: Payload, S: State, A> Visitor<P, S, A> {
    pub fn new(name: impl Into<String>, acc: A) -> Self {
        Self {
            name: name.into(),
            handlers: HashMap::new(),
            acc,
        }
    }

    /// Register the operation for `kind`, replacing any previous one.
    pub fn on<F>(mut self, kind: impl Into<String>, handler: F) -> Self
    where
        F: FnMut(&mut A, &mut Node<'_, P, S>) -> Result<Flow> + 'static,
    {
        self.handlers.insert(kind.into(), Box::new(handler));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handles(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }

    pub fn acc(&self) -> &A {
        &self.acc
    }

    pub fn into_result(self) -> A {
        self.acc
    }

    pub(crate) fn dispatch(
        &mut self,
        kind: &str,
        node: &mut Node<'_, P, S>,
    ) -> Option<Result<Flow>> {
        let handler = self.handlers.get_mut(kind)?;
        Some(handler(&mut self.acc, node))
    }
}

impl<P: Payload, S: State, A: fmt::Debug> fmt::Debug for Visitor<P, S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.handlers.keys().collect();
        kinds.sort();
        f.debug_struct("Visitor")
            .field("name", &self.name)
            .field("kinds", &kinds)
            .field("acc", &self.acc)
            .finish()
    }
}
