//! Identity contracts, snapshots and the command model shared by the whole engine
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::str::FromStr;
use std::sync::Arc;

use crate::errors::ReconcilerError;

/// Which side of the host's mutation a snapshot was captured on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pass {
    Before,
    After,
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pass::Before => f.write_str("before"),
            Pass::After => f.write_str("after"),
        }
    }
}

/// A section exposes an identifier that is unique within one snapshot.
///
/// Plain strings already satisfy this, so callers never need a wrapper type
/// just to name a section.
pub trait SectionIdentity {
    fn identifier(&self) -> &str;
}

impl SectionIdentity for str {
    fn identifier(&self) -> &str {
        self
    }
}

impl SectionIdentity for String {
    fn identifier(&self) -> &str {
        self.as_str()
    }
}

impl SectionIdentity for Box<str> {
    fn identifier(&self) -> &str {
        self
    }
}

impl SectionIdentity for Rc<str> {
    fn identifier(&self) -> &str {
        self
    }
}

impl SectionIdentity for Arc<str> {
    fn identifier(&self) -> &str {
        self
    }
}

impl SectionIdentity for Cow<'_, str> {
    fn identifier(&self) -> &str {
        self
    }
}

impl<T: SectionIdentity + ?Sized> SectionIdentity for &T {
    fn identifier(&self) -> &str {
        (**self).identifier()
    }
}

/// A row is matched across snapshots by its identity key. The attribute key is
/// an optional capability: rows that never report one are never updated, only
/// added or removed.
pub trait RowIdentity {
    type Key: Clone + Eq + Hash + fmt::Debug;

    fn identity_key(&self) -> Self::Key;

    fn attribute_key(&self) -> Option<u64> {
        None
    }
}

impl<T: RowIdentity + ?Sized> RowIdentity for &T {
    type Key = T::Key;

    fn identity_key(&self) -> Self::Key {
        (**self).identity_key()
    }

    fn attribute_key(&self) -> Option<u64> {
        (**self).attribute_key()
    }
}

/// Attribute signature of any hashable model value, e.g. a tuple of the fields
/// a cell displays.
pub fn attribute_hash<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Plain value row: an identity key and an optional attribute signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowSignature<K> {
    pub key: K,
    pub attribute: Option<u64>,
}

impl<K> RowSignature<K> {
    pub fn new(key: K) -> Self {
        RowSignature { key, attribute: None }
    }

    pub fn with_attribute(mut self, attribute: u64) -> Self {
        self.attribute = Some(attribute);
        self
    }
}

impl<K: Clone + Eq + Hash + fmt::Debug> RowIdentity for RowSignature<K> {
    type Key = K;

    fn identity_key(&self) -> K {
        self.key.clone()
    }

    fn attribute_key(&self) -> Option<u64> {
        self.attribute
    }
}

/// Rows of one section inside a snapshot.
#[derive(Debug, Clone)]
pub struct SectionRows<R> {
    pub identifier: String,
    pub rows: Vec<R>,
}

/// Immutable capture of the host's sections and rows at one point in time.
///
/// Duplicates are kept as captured; the differs reject them.
#[derive(Debug, Clone)]
pub struct Snapshot<R> {
    pass: Pass,
    sections: Vec<SectionRows<R>>,
}

impl<R> Snapshot<R> {
    pub fn new(pass: Pass) -> Self {
        Snapshot {
            pass,
            sections: Vec::new(),
        }
    }

    pub fn with_section<S: SectionIdentity>(mut self, section: S, rows: Vec<R>) -> Self {
        self.push_section(section, rows);
        self
    }

    pub fn push_section<S: SectionIdentity>(&mut self, section: S, rows: Vec<R>) {
        self.sections.push(SectionRows {
            identifier: section.identifier().to_string(),
            rows,
        });
    }

    pub fn pass(&self) -> Pass {
        self.pass
    }

    pub fn sections(&self) -> &[SectionRows<R>] {
        &self.sections
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.identifier.as_str())
    }

    /// Rows of the first section carrying `identifier`.
    pub fn rows(&self, identifier: &str) -> Option<&[R]> {
        self.sections
            .iter()
            .find(|s| s.identifier == identifier)
            .map(|s| s.rows.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

static COMMAND_KINDS: phf::Map<&'static str, CommandKind> = phf::phf_map! {
    "update_row" => CommandKind::UpdateRow,
    "add_row" => CommandKind::AddRow,
    "remove_row" => CommandKind::RemoveRow,
    "remove_section" => CommandKind::RemoveSection,
    "add_section" => CommandKind::AddSection,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    UpdateRow,
    AddRow,
    RemoveRow,
    RemoveSection,
    AddSection,
}

impl CommandKind {
    pub const ALL: [CommandKind; 5] = [
        CommandKind::UpdateRow,
        CommandKind::AddRow,
        CommandKind::RemoveRow,
        CommandKind::RemoveSection,
        CommandKind::AddSection,
    ];

    pub fn key(self) -> &'static str {
        match self {
            CommandKind::UpdateRow => "update_row",
            CommandKind::AddRow => "add_row",
            CommandKind::RemoveRow => "remove_row",
            CommandKind::RemoveSection => "remove_section",
            CommandKind::AddSection => "add_section",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        COMMAND_KINDS.get(key).copied()
    }

    pub fn is_row(self) -> bool {
        matches!(
            self,
            CommandKind::UpdateRow | CommandKind::AddRow | CommandKind::RemoveRow
        )
    }

    /// Removals resolve against the outdated layout, everything else against
    /// the updated one.
    pub fn is_removal(self) -> bool {
        matches!(self, CommandKind::RemoveRow | CommandKind::RemoveSection)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for CommandKind {
    type Err = ReconcilerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommandKind::from_key(s).ok_or_else(|| ReconcilerError::UnknownAnimationKey(s.to_string()))
    }
}

/// Section + row address. Orders by section first, then row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IndexPath {
    pub section: usize,
    pub row: usize,
}

impl IndexPath {
    pub fn new(section: usize, row: usize) -> Self {
        IndexPath { section, row }
    }
}

impl fmt::Display for IndexPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.section, self.row)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedPosition {
    Section(usize),
    Row(IndexPath),
}

impl ResolvedPosition {
    pub fn section(&self) -> usize {
        match self {
            ResolvedPosition::Section(section) => *section,
            ResolvedPosition::Row(path) => path.section,
        }
    }

    pub fn row(&self) -> Option<usize> {
        match self {
            ResolvedPosition::Section(_) => None,
            ResolvedPosition::Row(path) => Some(path.row),
        }
    }
}

/// The row a row-level command targets: its identity key and its index in the
/// section's rows of the layout the command resolves against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowTarget<K> {
    pub key: K,
    pub index: usize,
}

/// One structural edit produced by a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command<K> {
    kind: CommandKind,
    section_identifier: String,
    row: Option<RowTarget<K>>,
    resolved_position: Option<ResolvedPosition>,
}

impl<K> Command<K> {
    fn section_command(kind: CommandKind, section: &str) -> Self {
        Command {
            kind,
            section_identifier: section.to_string(),
            row: None,
            resolved_position: None,
        }
    }

    fn row_command(kind: CommandKind, section: &str, key: K, index: usize) -> Self {
        Command {
            kind,
            section_identifier: section.to_string(),
            row: Some(RowTarget { key, index }),
            resolved_position: None,
        }
    }

    pub fn add_section(section: &str) -> Self {
        Self::section_command(CommandKind::AddSection, section)
    }

    pub fn remove_section(section: &str) -> Self {
        Self::section_command(CommandKind::RemoveSection, section)
    }

    pub fn add_row(section: &str, key: K, index: usize) -> Self {
        Self::row_command(CommandKind::AddRow, section, key, index)
    }

    pub fn remove_row(section: &str, key: K, index: usize) -> Self {
        Self::row_command(CommandKind::RemoveRow, section, key, index)
    }

    pub fn update_row(section: &str, key: K, index: usize) -> Self {
        Self::row_command(CommandKind::UpdateRow, section, key, index)
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn section_identifier(&self) -> &str {
        &self.section_identifier
    }

    pub fn row(&self) -> Option<&RowTarget<K>> {
        self.row.as_ref()
    }

    pub fn row_key(&self) -> Option<&K> {
        self.row.as_ref().map(|r| &r.key)
    }

    /// `None` until the orderer has seen the full command set of the pass.
    pub fn resolved_position(&self) -> Option<ResolvedPosition> {
        self.resolved_position
    }

    pub(crate) fn resolve(&mut self, position: ResolvedPosition) {
        self.resolved_position = Some(position);
    }
}

impl<K: fmt::Debug> fmt::Display for Command<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}('{}'", self.kind, self.section_identifier)?;
        if let Some(row) = &self.row {
            write!(f, ", {:?}", row.key)?;
        }
        match self.resolved_position {
            Some(ResolvedPosition::Section(section)) => write!(f, ") @ {}", section),
            Some(ResolvedPosition::Row(path)) => write!(f, ") @ {}", path),
            None => write!(f, ")"),
        }
    }
}
