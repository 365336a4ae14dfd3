//! Resolves each command's final position and sorts a pass into an index-safe order
//!
//! Removals resolve against the outdated layout and run first, highest
//! position first, so an applied removal never shifts a pending one. Section
//! and row removals share that single descending sweep: everything in section
//! `n` is removed before anything in section `n - 1`, which keeps the outdated
//! row indices of lower sections valid. Additions and updates resolve against
//! the updated layout and run afterwards in ascending order, sections before
//! rows.
use crate::errors::ReconcilerError;
use crate::types::{Command, CommandKind, IndexPath, ResolvedPosition};
use indexmap::IndexSet;
use std::cmp::Reverse;
use std::collections::HashSet;

pub struct CommandOrderer<'a> {
    outdated_layout: &'a IndexSet<String>,
    updated_layout: &'a IndexSet<String>,
}

impl<'a> CommandOrderer<'a> {
    pub fn new(outdated_layout: &'a IndexSet<String>, updated_layout: &'a IndexSet<String>) -> Self {
        CommandOrderer {
            outdated_layout,
            updated_layout,
        }
    }

    fn resolve<K>(&self, command: &mut Command<K>) -> Result<(), ReconcilerError> {
        let layout = if command.kind().is_removal() {
            self.outdated_layout
        } else {
            self.updated_layout
        };
        let unresolved = || ReconcilerError::UnresolvedCommand {
            kind: command.kind(),
            section: command.section_identifier().to_string(),
        };

        let section = layout
            .get_index_of(command.section_identifier())
            .ok_or_else(unresolved)?;
        let position = match (command.kind().is_row(), command.row()) {
            (false, None) => ResolvedPosition::Section(section),
            (true, Some(row)) => ResolvedPosition::Row(IndexPath::new(section, row.index)),
            _ => return Err(unresolved()),
        };
        command.resolve(position);
        Ok(())
    }

    /// Resolve every command, drop row commands the section operations already
    /// cover, and return the commands in application order.
    pub fn order<K>(&self, commands: Vec<Command<K>>) -> Result<Vec<Command<K>>, ReconcilerError> {
        let section_ops: HashSet<(CommandKind, String)> = commands
            .iter()
            .filter(|c| !c.kind().is_row())
            .map(|c| (c.kind(), c.section_identifier().to_string()))
            .collect();

        let mut removals = Vec::new();
        let mut section_additions = Vec::new();
        let mut row_additions = Vec::new();
        let mut suppressed = 0usize;

        for mut command in commands {
            let covering_section = match command.kind() {
                CommandKind::RemoveRow => Some(CommandKind::RemoveSection),
                CommandKind::AddRow | CommandKind::UpdateRow => Some(CommandKind::AddSection),
                CommandKind::RemoveSection | CommandKind::AddSection => None,
            };
            if let Some(section_kind) = covering_section {
                if section_ops.contains(&(section_kind, command.section_identifier().to_string())) {
                    suppressed += 1;
                    continue;
                }
            }

            self.resolve(&mut command)?;
            match command.kind() {
                CommandKind::RemoveSection | CommandKind::RemoveRow => removals.push(command),
                CommandKind::AddSection => section_additions.push(command),
                CommandKind::AddRow | CommandKind::UpdateRow => row_additions.push(command),
            }
        }

        removals.sort_by_key(|c| Reverse(sort_key(c)));
        section_additions.sort_by_key(sort_key);
        row_additions.sort_by_key(sort_key);

        log::debug!(
            "CommandOrderer: {} removals, {} section additions, {} row additions/updates, {} suppressed",
            removals.len(),
            section_additions.len(),
            row_additions.len(),
            suppressed
        );

        let mut ordered = removals;
        ordered.append(&mut section_additions);
        ordered.append(&mut row_additions);
        Ok(ordered)
    }
}

fn sort_key<K>(command: &Command<K>) -> (usize, Option<usize>) {
    command
        .resolved_position()
        .map(|p| (p.section(), p.row()))
        .unwrap_or((usize::MAX, None))
}

/// Resolve and order one pass worth of commands.
pub fn order_commands<K>(
    commands: Vec<Command<K>>,
    outdated_layout: &IndexSet<String>,
    updated_layout: &IndexSet<String>,
) -> Result<Vec<Command<K>>, ReconcilerError> {
    CommandOrderer::new(outdated_layout, updated_layout).order(commands)
}

/// Sort index paths from the largest section and row down to the smallest, so
/// a host deleting from its own model one path at a time never shifts a path
/// it has yet to delete.
pub fn sort_delete_friendly(paths: &mut [IndexPath]) {
    paths.sort_unstable_by(|a, b| b.cmp(a));
}
