//! Identity-based differ: sections by identifier, rows by identity key within matched sections
use super::errors::ReconcilerError;
use super::types::*;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

/// A section present on one side only, with its index on that side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaggedSection {
    pub identifier: String,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedSection {
    pub identifier: String,
    pub outdated_index: usize,
    pub updated_index: usize,
}

/// Outcome of comparing two ordered section sequences. The layouts map an
/// identifier to its position (`get_index_of`).
#[derive(Debug, Clone, Default, Serialize)]
pub struct SectionDiff {
    pub removed: Vec<TaggedSection>,
    pub added: Vec<TaggedSection>,
    pub matched: Vec<MatchedSection>,
    pub outdated_layout: IndexSet<String>,
    pub updated_layout: IndexSet<String>,
}

/// Unordered commands of one pass plus the two section layouts they resolve against.
#[derive(Debug, Clone, Serialize)]
pub struct Diff<K> {
    pub commands: Vec<Command<K>>,
    pub outdated_layout: IndexSet<String>,
    pub updated_layout: IndexSet<String>,
}

fn section_layout<I>(sections: I, pass: Pass) -> Result<IndexSet<String>, ReconcilerError>
where
    I: IntoIterator,
    I::Item: SectionIdentity,
{
    let mut layout = IndexSet::new();
    for section in sections {
        let (_, inserted) = layout.insert_full(section.identifier().to_string());
        if !inserted {
            return Err(ReconcilerError::DuplicateSection {
                identifier: section.identifier().to_string(),
                pass,
            });
        }
    }
    Ok(layout)
}

/// Compare outdated and updated section sequences by identifier.
///
/// Fails on the first duplicate identifier in either sequence.
pub fn diff_sections<O, U>(outdated: O, updated: U) -> Result<SectionDiff, ReconcilerError>
where
    O: IntoIterator,
    O::Item: SectionIdentity,
    U: IntoIterator,
    U::Item: SectionIdentity,
{
    let outdated_layout = section_layout(outdated, Pass::Before)?;
    let updated_layout = section_layout(updated, Pass::After)?;

    let removed = outdated_layout
        .iter()
        .enumerate()
        .filter(|(_, id)| !updated_layout.contains(*id))
        .map(|(index, id)| TaggedSection {
            identifier: id.clone(),
            index,
        })
        .collect();

    let mut added = Vec::new();
    let mut matched = Vec::new();
    for (updated_index, id) in updated_layout.iter().enumerate() {
        match outdated_layout.get_index_of(id) {
            Some(outdated_index) => matched.push(MatchedSection {
                identifier: id.clone(),
                outdated_index,
                updated_index,
            }),
            None => added.push(TaggedSection {
                identifier: id.clone(),
                index: updated_index,
            }),
        }
    }

    Ok(SectionDiff {
        removed,
        added,
        matched,
        outdated_layout,
        updated_layout,
    })
}

/// Identity key -> (row index, attribute key), rejecting duplicate keys.
fn index_rows<R: RowIdentity>(
    section: &str,
    rows: &[R],
    pass: Pass,
) -> Result<IndexMap<R::Key, (usize, Option<u64>)>, ReconcilerError> {
    let mut index = IndexMap::with_capacity(rows.len());
    for (position, row) in rows.iter().enumerate() {
        let key = row.identity_key();
        if index.contains_key(&key) {
            return Err(ReconcilerError::DuplicateRow {
                section: section.to_string(),
                key: format!("{:?}", key),
                pass,
            });
        }
        index.insert(key, (position, row.attribute_key()));
    }
    Ok(index)
}

/// Compare the rows of one matched section.
///
/// Removals carry their outdated index, additions and updates their updated
/// index. Rows that only moved produce nothing.
pub fn diff_rows<R: RowIdentity>(
    section: &str,
    outdated: &[R],
    updated: &[R],
) -> Result<Vec<Command<R::Key>>, ReconcilerError> {
    let outdated_rows = index_rows(section, outdated, Pass::Before)?;
    let updated_rows = index_rows(section, updated, Pass::After)?;

    let mut commands = Vec::new();
    for (key, &(index, _)) in &outdated_rows {
        if !updated_rows.contains_key(key) {
            commands.push(Command::remove_row(section, key.clone(), index));
        }
    }

    for (key, &(index, attribute)) in &updated_rows {
        match outdated_rows.get(key) {
            None => commands.push(Command::add_row(section, key.clone(), index)),
            Some(&(_, previous)) => {
                if let (Some(before), Some(after)) = (previous, attribute) {
                    if before != after {
                        commands.push(Command::update_row(section, key.clone(), index));
                    }
                }
            }
        }
    }

    Ok(commands)
}

pub struct DiffEngine<'a, R: RowIdentity> {
    outdated: &'a Snapshot<R>,
    updated: &'a Snapshot<R>,
    commands: Vec<Command<R::Key>>,
}

impl<'a, R: RowIdentity> DiffEngine<'a, R> {
    pub fn new(outdated: &'a Snapshot<R>, updated: &'a Snapshot<R>) -> Self {
        DiffEngine {
            outdated,
            updated,
            commands: Vec::new(),
        }
    }

    pub fn run(mut self) -> Result<Diff<R::Key>, ReconcilerError> {
        let sections = diff_sections(self.outdated.identifiers(), self.updated.identifiers())?;

        for removed in &sections.removed {
            // Dropped with the section, but a duplicate key is still a caller error.
            if let Some(rows) = self.outdated.rows(&removed.identifier) {
                index_rows(&removed.identifier, rows, Pass::Before)?;
            }
            self.commands.push(Command::remove_section(&removed.identifier));
        }

        for added in &sections.added {
            if let Some(rows) = self.updated.rows(&added.identifier) {
                index_rows(&added.identifier, rows, Pass::After)?;
            }
            self.commands.push(Command::add_section(&added.identifier));
        }

        for matched in &sections.matched {
            self.diff_section_rows(&matched.identifier)?;
        }

        log::debug!(
            "DiffEngine: {} removed / {} added / {} matched sections -> {} commands",
            sections.removed.len(),
            sections.added.len(),
            sections.matched.len(),
            self.commands.len()
        );

        Ok(Diff {
            commands: self.commands,
            outdated_layout: sections.outdated_layout,
            updated_layout: sections.updated_layout,
        })
    }

    fn diff_section_rows(&mut self, identifier: &str) -> Result<(), ReconcilerError> {
        let outdated = self.outdated.rows(identifier).unwrap_or_default();
        let updated = self.updated.rows(identifier).unwrap_or_default();

        let commands = diff_rows(identifier, outdated, updated)?;
        if !commands.is_empty() {
            log::trace!(
                "DiffEngine: section '{}' rows {} -> {}, {} commands",
                identifier,
                outdated.len(),
                updated.len(),
                commands.len()
            );
        }
        self.commands.extend(commands);
        Ok(())
    }
}
