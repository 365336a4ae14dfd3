//! Identity-based reconciliation of sectioned list views
//!
//! A pass snapshots the host's sections and rows, lets the caller mutate the
//! backing data, snapshots again, and turns the difference into insert,
//! remove and reload commands ordered so the view can apply them one by one.
pub mod diff_engine;
pub mod errors;
pub mod host;
pub mod ordering;
pub mod types;

use std::fmt;

pub use crate::diff_engine::{Diff, DiffEngine, diff_rows, diff_sections};
pub use crate::errors::ReconcilerError;
pub use crate::host::{AnimationStyles, BatchUpdate, DataSource, RowAnimation, UpdatableView};
pub use crate::ordering::{CommandOrderer, order_commands, sort_delete_friendly};
pub use crate::types::{
    Command, CommandKind, IndexPath, Pass, ResolvedPosition, RowIdentity, RowSignature, RowTarget,
    SectionIdentity, Snapshot, attribute_hash,
};

/// Identity key type of a data source's rows.
pub type RowKey<D> = <<D as DataSource>::Row as RowIdentity>::Key;

/// Diff two snapshots and return the resolved commands in application order.
pub fn diff_snapshots<R: RowIdentity>(
    outdated: &Snapshot<R>,
    updated: &Snapshot<R>,
) -> Result<Vec<Command<R::Key>>, ReconcilerError> {
    let diff = DiffEngine::new(outdated, updated).run()?;
    order_commands(diff.commands, &diff.outdated_layout, &diff.updated_layout)
}

/// Where a pass currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    Idle,
    CapturingBefore,
    AwaitingHostMutation,
    CapturingAfter,
    Diffing,
    Ordering,
    Applying,
}

/// Runs one reconciliation pass against a borrowed view.
///
/// The view stays mutably borrowed for the whole pass, so a second pass on the
/// same view cannot start until this one has returned.
pub struct Reconciler<'v, V: UpdatableView + ?Sized> {
    view: &'v mut V,
    animations: AnimationStyles<V::Animation>,
    state: PassState,
}

impl<'v, V: UpdatableView + ?Sized> Reconciler<'v, V> {
    pub fn new(view: &'v mut V) -> Self {
        Reconciler {
            view,
            animations: AnimationStyles::default(),
            state: PassState::Idle,
        }
    }

    /// Use one style for every command kind.
    pub fn with_animation(mut self, style: V::Animation) -> Self {
        self.animations = AnimationStyles::uniform(style);
        self
    }

    pub fn with_animations(mut self, animations: AnimationStyles<V::Animation>) -> Self {
        self.animations = animations;
        self
    }

    pub fn reconcile<D, F>(self, source: &mut D, update: F) -> Result<Vec<Command<RowKey<D>>>, ReconcilerError>
    where
        D: DataSource + ?Sized,
        F: FnOnce(&mut D),
    {
        self.reconcile_with_callback(source, update, |_| {})
    }

    /// Full pass. `update` must finish mutating the source before it returns;
    /// the after snapshot is taken right away. `callback` sees every command,
    /// already resolved, just before the view receives it.
    pub fn reconcile_with_callback<D, F, C>(
        mut self,
        source: &mut D,
        update: F,
        callback: C,
    ) -> Result<Vec<Command<RowKey<D>>>, ReconcilerError>
    where
        D: DataSource + ?Sized,
        F: FnOnce(&mut D),
        C: FnMut(&Command<RowKey<D>>),
    {
        log::debug!("Reconciler: starting pass");

        self.enter(PassState::CapturingBefore);
        let outdated = Snapshot::capture(&*source, Pass::Before).inspect_err(|e| self.aborted(e))?;

        self.enter(PassState::AwaitingHostMutation);
        update(source);

        self.enter(PassState::CapturingAfter);
        let updated = Snapshot::capture(&*source, Pass::After).inspect_err(|e| self.aborted(e))?;

        self.run(&outdated, &updated, callback)
    }

    /// Diff, order and apply two snapshots the caller captured itself.
    pub fn apply_snapshots<R, C>(
        self,
        outdated: &Snapshot<R>,
        updated: &Snapshot<R>,
        callback: C,
    ) -> Result<Vec<Command<R::Key>>, ReconcilerError>
    where
        R: RowIdentity,
        C: FnMut(&Command<R::Key>),
    {
        self.run(outdated, updated, callback)
    }

    fn run<R, C>(
        mut self,
        outdated: &Snapshot<R>,
        updated: &Snapshot<R>,
        callback: C,
    ) -> Result<Vec<Command<R::Key>>, ReconcilerError>
    where
        R: RowIdentity,
        C: FnMut(&Command<R::Key>),
    {
        self.enter(PassState::Diffing);
        let diff = DiffEngine::new(outdated, updated)
            .run()
            .inspect_err(|e| self.aborted(e))?;

        self.enter(PassState::Ordering);
        let commands = order_commands(diff.commands, &diff.outdated_layout, &diff.updated_layout)
            .inspect_err(|e| self.aborted(e))?;

        self.enter(PassState::Applying);
        self.apply(&commands, callback).inspect_err(|e| self.aborted(e))?;

        self.enter(PassState::Idle);
        log::debug!("Reconciler: pass applied {} commands", commands.len());
        Ok(commands)
    }
}

// Private helpers
impl<V: UpdatableView + ?Sized> Reconciler<'_, V> {
    fn enter(&mut self, next: PassState) {
        log::debug!("Reconciler: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn aborted(&self, err: &ReconcilerError) {
        log::debug!("Reconciler: pass aborted during {:?}: {}", self.state, err);
    }

    /// Dispatch every command inside one batch. A failing primitive stops the
    /// batch; commands already dispatched stay applied.
    fn apply<K, C>(&mut self, commands: &[Command<K>], mut callback: C) -> Result<(), ReconcilerError>
    where
        K: fmt::Debug,
        C: FnMut(&Command<K>),
    {
        let animations = self.animations;
        let mut batch = BatchUpdate::begin(&mut *self.view);
        for command in commands {
            callback(command);
            log::trace!("Reconciler: dispatching {}", command);
            dispatch(&mut *batch, command, animations.for_kind(command.kind()))?;
        }
        Ok(())
    }
}

fn dispatch<V, K>(view: &mut V, command: &Command<K>, animation: V::Animation) -> Result<(), ReconcilerError>
where
    V: UpdatableView + ?Sized,
{
    match (command.kind(), command.resolved_position()) {
        (CommandKind::RemoveSection, Some(ResolvedPosition::Section(section))) => view
            .remove_sections(&[section], animation)
            .map_err(ReconcilerError::host("remove_sections")),
        (CommandKind::AddSection, Some(ResolvedPosition::Section(section))) => view
            .insert_sections(&[section], animation)
            .map_err(ReconcilerError::host("insert_sections")),
        (CommandKind::RemoveRow, Some(ResolvedPosition::Row(path))) => view
            .remove_rows(&[path], animation)
            .map_err(ReconcilerError::host("remove_rows")),
        (CommandKind::AddRow, Some(ResolvedPosition::Row(path))) => view
            .insert_rows(&[path], animation)
            .map_err(ReconcilerError::host("insert_rows")),
        (CommandKind::UpdateRow, Some(ResolvedPosition::Row(path))) => view
            .reload_rows(&[path], animation)
            .map_err(ReconcilerError::host("reload_rows")),
        (kind, _) => Err(ReconcilerError::UnresolvedCommand {
            kind,
            section: command.section_identifier().to_string(),
        }),
    }
}
