//! Change journal for reversible store mutations.
//!
//! While a command runs, every store mutation appends a [`Change`] that
//! carries enough information to invert it. Frames nest: a sub-command opens
//! its own frame, and rolling a frame back reverts exactly the changes made
//! since it was opened. Committing a nested frame leaves its changes in place
//! for the enclosing frame; committing the outermost frame hands the whole
//! change list to the caller.

use crate::core::{EntityId, Payload, State};
use crate::machine::TransitionRecord;
use crate::snapshot::Memento;
use crate::store::Entity;
use std::collections::HashSet;

/// One inverted store mutation.
#[derive(Clone, Debug)]
pub(crate) enum Change<P: Payload, S: State> {
    /// Pre-image of an entity's payload and state, taken on first touch.
    Touched(Memento<P, S>),
    /// An entity (and, when reinserted, its subtree) came into existence.
    Created(EntityId),
    /// The id allocator moved from `from` to `to`.
    Allocated { from: u64, to: u64 },
    /// An entity left the placement it had before the change.
    Moved {
        child: EntityId,
        parent: Option<EntityId>,
        index: usize,
    },
    /// A detached subtree was removed, root first.
    Removed(Vec<Entity<P, S>>),
}

#[derive(Debug)]
struct Frame {
    start: usize,
    fired: usize,
    guarded: HashSet<EntityId>,
}

#[derive(Debug)]
pub(crate) struct Journal<P: Payload, S: State> {
    entries: Vec<Change<P, S>>,
    frames: Vec<Frame>,
    paused: bool,
    fired: Vec<TransitionRecord<S>>,
}

impl<P: Payload, S: State> Default for Journal<P, S> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            frames: Vec::new(),
            paused: false,
            fired: Vec::new(),
        }
    }
}

impl<P: Payload, S: State> Journal<P, S> {
    pub(crate) fn is_recording(&self) -> bool {
        !self.paused && !self.frames.is_empty()
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Open a frame. `guarded` ids already have a pre-image held elsewhere.
    pub(crate) fn begin(&mut self, guarded: impl IntoIterator<Item = EntityId>) {
        self.frames.push(Frame {
            start: self.entries.len(),
            fired: self.fired.len(),
            guarded: guarded.into_iter().collect(),
        });
    }

    /// Returns true the first time `id` is touched in the innermost frame.
    pub(crate) fn first_touch(&mut self, id: EntityId) -> bool {
        match self.frames.last_mut() {
            Some(frame) => frame.guarded.insert(id),
            None => false,
        }
    }

    pub(crate) fn push(&mut self, change: Change<P, S>) {
        if self.is_recording() {
            self.entries.push(change);
        }
    }

    /// Close the innermost frame, keeping its changes.
    ///
    /// Returns the full change list when the outermost frame closes.
    pub(crate) fn commit(&mut self) -> Option<Vec<Change<P, S>>> {
        let frame = self.frames.pop()?;
        match self.frames.last_mut() {
            Some(parent) => {
                parent.guarded.extend(frame.guarded);
                None
            }
            None => Some(std::mem::take(&mut self.entries)),
        }
    }

    /// Close the innermost frame, returning its changes for reversal.
    ///
    /// Transitions fired inside the frame are dropped with it.
    pub(crate) fn rollback(&mut self) -> Vec<Change<P, S>> {
        match self.frames.pop() {
            Some(frame) => {
                self.fired.truncate(frame.fired);
                self.entries.split_off(frame.start)
            }
            None => Vec::new(),
        }
    }

    /// Hold a transition until the outermost frame commits.
    ///
    /// Hands the record back when no frame is open.
    pub(crate) fn defer(&mut self, record: TransitionRecord<S>) -> Option<TransitionRecord<S>> {
        if self.frames.is_empty() {
            return Some(record);
        }
        self.fired.push(record);
        None
    }

    /// Transitions that survived every frame they were fired in.
    pub(crate) fn take_fired(&mut self) -> Vec<TransitionRecord<S>> {
        if self.frames.is_empty() {
            std::mem::take(&mut self.fired)
        } else {
            Vec::new()
        }
    }

    pub(crate) fn set_paused(&mut self, paused: bool) -> bool {
        std::mem::replace(&mut self.paused, paused)
    }
}
