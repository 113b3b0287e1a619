//! Command execution and undo/redo history.
//!
//! # Key Concepts
//!
//! - **Execute**: capture every declared target, run the command, and on
//!   success push a [`HistoryRecord`] and clear the redo stack. On failure
//!   the store is rolled back to exactly what it was before.
//! - **Undo**: revert the record's change journal and restore its mementos.
//! - **Redo**: re-run the command, or replay the undo journal backwards,
//!   depending on [`RedoStrategy`].
//!
//! Both stacks are bounded by [`HistoryConfig::max_depth`]; the oldest undo
//! record is evicted first.

mod config;
mod record;

pub use config::{HistoryConfig, RedoStrategy};
pub use record::HistoryRecord;

use crate::builder::BuildError;
use crate::command::{BoxedCommand, Command, Descriptor, Effect, Session};
use crate::core::{EngineError, EntityId, Payload, Result, State};
use crate::machine::{StateMachine, TransitionRecord};
use crate::snapshot::{self, Memento};
use crate::store::journal::Change;
use crate::store::EntityStore;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, error, warn};

/// Current sizes of the undo and redo stacks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryDepth {
    pub undo: usize,
    pub redo: usize,
}

/// Owner of the undo and redo stacks.
#[derive(Debug)]
pub struct HistoryManager<P: Payload, S: State> {
    config: HistoryConfig,
    undo: VecDeque<HistoryRecord<P, S>>,
    redo: Vec<HistoryRecord<P, S>>,
}

struct Applied<P: Payload, S: State> {
    effect: Effect<S>,
    snapshots: Vec<Memento<P, S>>,
    changes: Vec<Change<P, S>>,
}

impl<P: Payload, S: State> Default for HistoryManager<P, S> {
    fn default() -> Self {
        Self {
            config: HistoryConfig::default(),
            undo: VecDeque::new(),
            redo: Vec::new(),
        }
    }
}

impl<P: Payload, S: State> HistoryManager<P, S> {
    pub fn new(config: HistoryConfig) -> std::result::Result<Self, BuildError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    pub fn depth(&self) -> HistoryDepth {
        HistoryDepth {
            undo: self.undo.len(),
            redo: self.redo.len(),
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Descriptors on the undo stack, most recent first.
    pub fn undo_descriptors(&self) -> impl Iterator<Item = &Descriptor> + '_ {
        self.undo.iter().rev().map(HistoryRecord::descriptor)
    }

    /// Descriptors on the redo stack, next to redo first.
    pub fn redo_descriptors(&self) -> impl Iterator<Item = &Descriptor> + '_ {
        self.redo.iter().rev().map(HistoryRecord::descriptor)
    }

    /// Drop both stacks and every memento they hold.
    pub fn clear(&mut self) {
        debug!(
            undo = self.undo.len(),
            redo = self.redo.len(),
            "history cleared"
        );
        self.undo.clear();
        self.redo.clear();
    }

    /// Execute a command and record it for undo.
    pub fn execute<C>(
        &mut self,
        store: &mut EntityStore<P, S>,
        machine: &StateMachine<P, S>,
        command: C,
    ) -> Result<Effect<S>>
    where
        C: Command<P, S> + 'static,
    {
        self.execute_boxed(store, machine, Box::new(command))
    }

    pub fn execute_boxed(
        &mut self,
        store: &mut EntityStore<P, S>,
        machine: &StateMachine<P, S>,
        command: BoxedCommand<P, S>,
    ) -> Result<Effect<S>> {
        let applied = run(store, machine, command.as_ref())?;
        let record = HistoryRecord::new(command, applied.snapshots, applied.changes);
        debug!(
            record = %record.id,
            kind = %record.descriptor.kind,
            targets = record.descriptor.targets.len(),
            "command executed"
        );

        self.redo.clear();
        self.push_undo(record);
        Ok(applied.effect)
    }

    /// Reverse the most recent command.
    ///
    /// Observers are told about every state tag the undo changed, with
    /// `"undo"` as the trigger.
    pub fn undo(
        &mut self,
        store: &mut EntityStore<P, S>,
        machine: &StateMachine<P, S>,
    ) -> Result<Descriptor> {
        let mut record = self.undo.pop_back().ok_or(EngineError::NothingToUndo)?;
        let before = states_before(store, &record);

        store.begin_frame([]);
        let reverted = store
            .revert(record.changes.clone(), true)
            .and_then(|()| restore_all(store, &record.snapshots));
        if let Err(err) = reverted {
            let err = rollback(store, &record.descriptor, err);
            self.undo.push_back(record);
            return Err(err);
        }
        let undo_changes = store.commit_frame().unwrap_or_default();
        notify_shifts(store, machine, before, "undo");

        if self.config.redo == RedoStrategy::PostImage {
            record.changes = undo_changes;
        }
        debug!(record = %record.id, kind = %record.descriptor.kind, "command undone");

        let descriptor = record.descriptor.clone();
        self.redo.push(record);
        Ok(descriptor)
    }

    /// Bring back the most recently undone command.
    pub fn redo(
        &mut self,
        store: &mut EntityStore<P, S>,
        machine: &StateMachine<P, S>,
    ) -> Result<Descriptor> {
        let mut record = self.redo.pop().ok_or(EngineError::NothingToRedo)?;

        let outcome = match self.config.redo {
            RedoStrategy::Reexecute => run(store, machine, record.command.as_ref()).map(|applied| {
                record.snapshots = applied.snapshots;
                record.changes = applied.changes;
            }),
            RedoStrategy::PostImage => {
                let before = states_before(store, &record);
                store.begin_frame([]);
                match store.revert(record.changes.clone(), true) {
                    Ok(()) => {
                        record.changes = store.commit_frame().unwrap_or_default();
                        notify_shifts(store, machine, before, "redo");
                        Ok(())
                    }
                    Err(err) => Err(rollback(store, &record.descriptor, err)),
                }
            }
        };

        if let Err(err) = outcome {
            warn!(record = %record.id, error = %err, "redo failed, record kept");
            self.redo.push(record);
            return Err(err);
        }

        record.executed_at = Utc::now();
        debug!(record = %record.id, kind = %record.descriptor.kind, "command redone");
        let descriptor = record.descriptor.clone();
        self.push_undo(record);
        Ok(descriptor)
    }

    fn push_undo(&mut self, record: HistoryRecord<P, S>) {
        self.undo.push_back(record);
        while self.undo.len() > self.config.max_depth {
            if let Some(evicted) = self.undo.pop_front() {
                debug!(
                    record = %evicted.id,
                    kind = %evicted.descriptor.kind,
                    "oldest history record evicted"
                );
            }
        }
    }
}

/// Capture targets, run `command` in a journaled frame, and roll everything
/// back if it fails.
fn run<P: Payload, S: State>(
    store: &mut EntityStore<P, S>,
    machine: &StateMachine<P, S>,
    command: &dyn Command<P, S>,
) -> Result<Applied<P, S>> {
    let descriptor = command.descriptor();
    let snapshots = descriptor
        .targets
        .iter()
        .map(|id| snapshot::capture(store, *id))
        .collect::<Result<Vec<_>>>()?;

    store.begin_frame(descriptor.targets.iter().copied());
    match command.execute(&mut Session::new(store, machine)) {
        Ok(effect) => {
            let changes = store.commit_frame().unwrap_or_default();
            machine.notify(&store.take_transitions());
            Ok(Applied {
                effect,
                snapshots,
                changes,
            })
        }
        Err(err) => {
            let err = rollback(store, &descriptor, err);
            let restored = restore_all(store, &snapshots);
            if let Err(restore_err) = &restored {
                error!(kind = %descriptor.kind, error = %restore_err, "restoring targets failed");
            }
            warn!(kind = %descriptor.kind, error = %err, "command failed, store rolled back");
            Err(err.rolled_back(restored))
        }
    }
}

fn restore_all<P: Payload, S: State>(
    store: &mut EntityStore<P, S>,
    snapshots: &[Memento<P, S>],
) -> Result<()> {
    snapshots
        .iter()
        .try_for_each(|memento| snapshot::restore(store, memento.entity(), memento))
}

/// Roll back the open frame after `err`, folding in any rollback failure.
fn rollback<P: Payload, S: State>(
    store: &mut EntityStore<P, S>,
    descriptor: &Descriptor,
    err: EngineError,
) -> EngineError {
    let rollback = store.rollback_frame();
    if let Err(failure) = &rollback {
        error!(kind = %descriptor.kind, error = %failure, "rollback failed");
    }
    err.rolled_back(rollback)
}

/// Current states of every entity a record can touch.
fn states_before<P: Payload, S: State>(
    store: &EntityStore<P, S>,
    record: &HistoryRecord<P, S>,
) -> Vec<(EntityId, S)> {
    let touched = record.changes.iter().filter_map(|change| match change {
        Change::Touched(memento) => Some(memento.entity()),
        _ => None,
    });
    let mut ids: Vec<EntityId> = record
        .snapshots
        .iter()
        .map(Memento::entity)
        .chain(touched)
        .collect();
    ids.sort();
    ids.dedup();
    ids.into_iter()
        .filter_map(|id| store.get(id).ok().map(|e| (id, e.state().clone())))
        .collect()
}

/// Tell observers about state tags that `trigger` (undo or redo) changed.
fn notify_shifts<P: Payload, S: State>(
    store: &EntityStore<P, S>,
    machine: &StateMachine<P, S>,
    before: Vec<(EntityId, S)>,
    trigger: &str,
) {
    let timestamp = Utc::now();
    let shifts: Vec<_> = before
        .into_iter()
        .filter_map(|(entity, from)| {
            let to = store.get(entity).ok()?.state().clone();
            (to != from).then(|| TransitionRecord {
                entity,
                trigger: trigger.to_string(),
                from,
                to,
                timestamp,
            })
        })
        .collect();
    machine.notify(&shifts);
}
