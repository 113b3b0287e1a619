//! Undo stack entries.

use crate::command::{BoxedCommand, Descriptor};
use crate::core::{Payload, State};
use crate::snapshot::Memento;
use crate::store::journal::Change;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// An executed command together with everything needed to reverse it.
///
/// The mementos cover the command's declared targets. The change journal
/// covers everything else the command did to the store: structural edits,
/// id allocation and pre-images of entities it touched without declaring.
/// After an undo under [`RedoStrategy::PostImage`](super::RedoStrategy)
/// the journal holds the undo's own changes instead.
#[derive(Debug)]
pub struct HistoryRecord<P: Payload, S: State> {
    pub(crate) id: Uuid,
    pub(crate) descriptor: Descriptor,
    pub(crate) command: BoxedCommand<P, S>,
    pub(crate) snapshots: Vec<Memento<P, S>>,
    pub(crate) changes: Vec<Change<P, S>>,
    pub(crate) executed_at: DateTime<Utc>,
}

impl<P: Payload, S: State> HistoryRecord<P, S> {
    pub(crate) fn new(
        command: BoxedCommand<P, S>,
        snapshots: Vec<Memento<P, S>>,
        changes: Vec<Change<P, S>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            descriptor: command.descriptor(),
            command,
            snapshots,
            changes,
            executed_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// When the command last ran (initial execution or redo).
    pub fn executed_at(&self) -> DateTime<Utc> {
        self.executed_at
    }
}
