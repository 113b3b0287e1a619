//! Structural traversal with type-keyed visitors.
//!
//! [`accept`] walks a subtree parent-before-children and looks up the
//! visitor's operation for each entity's kind. A kind without an operation
//! is an error, never a silent skip. Operations steer the walk by returning
//! a [`Flow`].

mod node;
mod visitor;

pub use node::Node;
pub use visitor::{Handler, Visitor};

use crate::core::{EngineError, EntityId, Payload, Result, State};
use crate::store::EntityStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// What the walk does after an operation returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Flow {
    Continue,
    /// Do not descend into the current entity's children.
    SkipChildren,
    /// End the walk successfully.
    Stop,
}

/// Summary of a finished walk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Walk {
    /// Entities whose operation ran.
    pub visited: usize,
    /// Whether an operation requested [`Flow::Stop`].
    pub stopped: bool,
}

/// Visit the subtree rooted at `root` in pre-order.
///
/// Fails with `UnhandledEntityType` as soon as an entity's kind has no
/// operation in `visitor`. Payload and state changes made before a failure
/// stay in place; traversal is not a command and has no rollback.
pub fn accept<P: Payload, S: State, A>(
    store: &mut EntityStore<P, S>,
    root: EntityId,
    visitor: &mut Visitor<P, S, A>,
) -> Result<Walk> {
    store.get(root)?;
    let mut walk = Walk::default();
    let mut stack = vec![(root, 0usize)];

    while let Some((id, depth)) = stack.pop() {
        let kind = store.get(id)?.kind().to_string();
        trace!(visitor = visitor.name(), entity = %id, kind = %kind, depth, "visiting");

        let mut node = Node::new(store, id, depth);
        let flow = visitor
            .dispatch(&kind, &mut node)
            .ok_or_else(|| EngineError::UnhandledEntityType {
                visitor: visitor.name().to_string(),
                kind: kind.clone(),
            })??;
        walk.visited += 1;

        match flow {
            Flow::Continue => {
                let children = store.children_of(id)?;
                stack.extend(children.iter().rev().map(|child| (*child, depth + 1)));
            }
            Flow::SkipChildren => {}
            Flow::Stop => {
                walk.stopped = true;
                break;
            }
        }
    }

    debug!(
        visitor = visitor.name(),
        root = %root,
        visited = walk.visited,
        stopped = walk.stopped,
        "walk finished"
    );
    Ok(walk)
}
