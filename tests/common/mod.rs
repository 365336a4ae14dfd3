//! Shared fixtures: a grocery-shelf data source and a view that applies
//! primitives by literal index, the way a real list view shifts its rows.
#![allow(dead_code)]

use section_reconciler::{
    CommandKind, DataSource, IndexPath, Pass, RowAnimation, RowIdentity, RowSignature, Snapshot,
    UpdatableView, attribute_hash,
};
use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;
use thiserror::Error;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Rows as the view shows them: identity key + attribute signature.
pub type Layout = Vec<(String, Vec<(u32, Option<u64>)>)>;

// ---------------------------------------------------------------------------
// Data source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: u32,
    pub quantity: u32,
}

impl Item {
    pub fn new(id: u32, quantity: u32) -> Self {
        Item { id, quantity }
    }
}

impl RowIdentity for Item {
    type Key = u32;

    fn identity_key(&self) -> u32 {
        self.id
    }

    fn attribute_key(&self) -> Option<u64> {
        Some(attribute_hash(&self.quantity))
    }
}

#[derive(Debug, Error)]
#[error("shelf unavailable during the {0} pass")]
pub struct ShelfError(pub Pass);

#[derive(Debug, Clone, Default)]
pub struct Shelf {
    pub aisles: Vec<(String, Vec<Item>)>,
    pub fail_on: Option<Pass>,
}

impl Shelf {
    pub fn new(aisles: &[(&str, &[(u32, u32)])]) -> Self {
        Shelf {
            aisles: aisles
                .iter()
                .map(|(name, items)| {
                    let items = items.iter().map(|&(id, qty)| Item::new(id, qty)).collect();
                    (name.to_string(), items)
                })
                .collect(),
            fail_on: None,
        }
    }

    pub fn layout(&self) -> Layout {
        self.aisles
            .iter()
            .map(|(name, items)| {
                let rows = items.iter().map(|i| (i.identity_key(), i.attribute_key())).collect();
                (name.clone(), rows)
            })
            .collect()
    }
}

impl DataSource for Shelf {
    type Section = String;
    type Row = Item;
    type Error = ShelfError;

    fn sections(&self, pass: Pass) -> Result<Vec<String>, ShelfError> {
        if self.fail_on == Some(pass) {
            return Err(ShelfError(pass));
        }
        Ok(self.aisles.iter().map(|(name, _)| name.clone()).collect())
    }

    fn rows(&self, section: &String, _pass: Pass) -> Result<Vec<Item>, ShelfError> {
        Ok(self
            .aisles
            .iter()
            .find(|(name, _)| name == section)
            .map(|(_, items)| items.clone())
            .unwrap_or_default())
    }
}

/// Snapshot source over a fixed layout, for callers that never mutate.
pub struct FixedSource(pub Layout);

impl DataSource for FixedSource {
    type Section = String;
    type Row = RowSignature<u32>;
    type Error = Infallible;

    fn sections(&self, _pass: Pass) -> Result<Vec<String>, Infallible> {
        Ok(self.0.iter().map(|(name, _)| name.clone()).collect())
    }

    fn rows(&self, section: &String, _pass: Pass) -> Result<Vec<RowSignature<u32>>, Infallible> {
        Ok(self
            .0
            .iter()
            .find(|(name, _)| name == section)
            .map(|(_, rows)| rows.iter().map(|&(key, attr)| signature(key, attr)).collect())
            .unwrap_or_default())
    }
}

pub fn signature(key: u32, attribute: Option<u64>) -> RowSignature<u32> {
    RowSignature { key, attribute }
}

pub fn snapshot_of(layout: &Layout, pass: Pass) -> Snapshot<RowSignature<u32>> {
    let mut snapshot = Snapshot::new(pass);
    for (name, rows) in layout {
        snapshot.push_section(name, rows.iter().map(|&(k, a)| signature(k, a)).collect());
    }
    snapshot
}

// ---------------------------------------------------------------------------
// Simulated view
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum ViewError {
    #[error("{primitive} out of bounds at {at}")]
    OutOfBounds { primitive: &'static str, at: String },
    #[error("reload of {at} hit row {found} instead of {expected}")]
    WrongRow { at: String, found: u32, expected: u32 },
    #[error("{0} refused")]
    Refused(&'static str),
}

/// Applies every primitive to its own copy of the rows, by literal index.
/// Inserted and reloaded content is read from `target`, the way a list view
/// asks its data source for the new cells.
pub struct SimulatedView {
    pub shown: Layout,
    pub target: Layout,
    pub events: Rc<RefCell<Vec<String>>>,
    pub animations: Vec<(CommandKind, RowAnimation)>,
    pub begun: usize,
    pub ended: usize,
    pub refuse: Option<&'static str>,
}

impl SimulatedView {
    pub fn new(shown: Layout, target: Layout) -> Self {
        SimulatedView {
            shown,
            target,
            events: Rc::new(RefCell::new(Vec::new())),
            animations: Vec::new(),
            begun: 0,
            ended: 0,
            refuse: None,
        }
    }

    fn record(&mut self, primitive: &'static str, kind: CommandKind, at: String, animation: RowAnimation) -> Result<(), ViewError> {
        if self.refuse == Some(primitive) {
            return Err(ViewError::Refused(primitive));
        }
        self.events.borrow_mut().push(format!("{} {}", primitive, at));
        self.animations.push((kind, animation));
        Ok(())
    }

    fn target_row(&self, path: IndexPath, primitive: &'static str) -> Result<(u32, Option<u64>), ViewError> {
        self.target
            .get(path.section)
            .and_then(|(_, rows)| rows.get(path.row))
            .copied()
            .ok_or(ViewError::OutOfBounds { primitive, at: path.to_string() })
    }

    fn shown_rows(&mut self, path: IndexPath, primitive: &'static str) -> Result<&mut Vec<(u32, Option<u64>)>, ViewError> {
        self.shown
            .get_mut(path.section)
            .map(|(_, rows)| rows)
            .ok_or(ViewError::OutOfBounds { primitive, at: path.to_string() })
    }
}

impl UpdatableView for SimulatedView {
    type Animation = RowAnimation;
    type Error = ViewError;

    fn remove_sections(&mut self, sections: &[usize], animation: RowAnimation) -> Result<(), ViewError> {
        for &section in sections {
            self.record("remove_sections", CommandKind::RemoveSection, section.to_string(), animation)?;
            if section >= self.shown.len() {
                return Err(ViewError::OutOfBounds { primitive: "remove_sections", at: section.to_string() });
            }
            self.shown.remove(section);
        }
        Ok(())
    }

    fn insert_sections(&mut self, sections: &[usize], animation: RowAnimation) -> Result<(), ViewError> {
        for &section in sections {
            self.record("insert_sections", CommandKind::AddSection, section.to_string(), animation)?;
            let content = self.target.get(section).cloned();
            match content {
                Some(content) if section <= self.shown.len() => self.shown.insert(section, content),
                _ => return Err(ViewError::OutOfBounds { primitive: "insert_sections", at: section.to_string() }),
            }
        }
        Ok(())
    }

    fn remove_rows(&mut self, paths: &[IndexPath], animation: RowAnimation) -> Result<(), ViewError> {
        for &path in paths {
            self.record("remove_rows", CommandKind::RemoveRow, path.to_string(), animation)?;
            let rows = self.shown_rows(path, "remove_rows")?;
            if path.row >= rows.len() {
                return Err(ViewError::OutOfBounds { primitive: "remove_rows", at: path.to_string() });
            }
            rows.remove(path.row);
        }
        Ok(())
    }

    fn insert_rows(&mut self, paths: &[IndexPath], animation: RowAnimation) -> Result<(), ViewError> {
        for &path in paths {
            self.record("insert_rows", CommandKind::AddRow, path.to_string(), animation)?;
            let row = self.target_row(path, "insert_rows")?;
            let rows = self.shown_rows(path, "insert_rows")?;
            if path.row > rows.len() {
                return Err(ViewError::OutOfBounds { primitive: "insert_rows", at: path.to_string() });
            }
            rows.insert(path.row, row);
        }
        Ok(())
    }

    fn reload_rows(&mut self, paths: &[IndexPath], animation: RowAnimation) -> Result<(), ViewError> {
        for &path in paths {
            self.record("reload_rows", CommandKind::UpdateRow, path.to_string(), animation)?;
            let row = self.target_row(path, "reload_rows")?;
            let rows = self.shown_rows(path, "reload_rows")?;
            let slot = rows
                .get_mut(path.row)
                .ok_or(ViewError::OutOfBounds { primitive: "reload_rows", at: path.to_string() })?;
            if slot.0 != row.0 {
                return Err(ViewError::WrongRow { at: path.to_string(), found: slot.0, expected: row.0 });
            }
            *slot = row;
        }
        Ok(())
    }

    fn begin_updates(&mut self) {
        self.begun += 1;
        self.events.borrow_mut().push("begin".to_string());
    }

    fn end_updates(&mut self) {
        self.ended += 1;
        self.events.borrow_mut().push("end".to_string());
    }
}
