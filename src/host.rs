//! Collaborator contracts: the data source that is snapshotted and the view that applies commands
use crate::errors::ReconcilerError;
use crate::types::{CommandKind, IndexPath, Pass, RowIdentity, SectionIdentity, Snapshot};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};

/// Supplies the host's sections and rows. Called once per [`Pass`].
pub trait DataSource {
    type Section: SectionIdentity;
    type Row: RowIdentity;
    type Error: std::error::Error + Send + Sync + 'static;

    fn sections(&self, pass: Pass) -> Result<Vec<Self::Section>, Self::Error>;

    fn rows(&self, section: &Self::Section, pass: Pass) -> Result<Vec<Self::Row>, Self::Error>;
}

impl<R> Snapshot<R> {
    /// Pull one snapshot from the data source.
    pub fn capture<D>(source: &D, pass: Pass) -> Result<Self, ReconcilerError>
    where
        D: DataSource<Row = R> + ?Sized,
    {
        let sections = source
            .sections(pass)
            .map_err(ReconcilerError::data_source(pass))?;

        let mut snapshot = Snapshot::new(pass);
        for section in sections {
            let rows = source
                .rows(&section, pass)
                .map_err(ReconcilerError::data_source(pass))?;
            snapshot.push_section(&section, rows);
        }
        Ok(snapshot)
    }
}

/// Batched structural mutation primitives of a list-like view.
///
/// Indices handed to removals address the layout as it currently is; the
/// reconciler feeds them in an order where that is always true.
pub trait UpdatableView {
    /// Transition style forwarded untouched to every primitive. Views with no
    /// animation concept use `()`.
    type Animation: Copy + Default + std::fmt::Debug;
    type Error: std::error::Error + Send + Sync + 'static;

    fn remove_sections(&mut self, sections: &[usize], animation: Self::Animation) -> Result<(), Self::Error>;

    fn insert_sections(&mut self, sections: &[usize], animation: Self::Animation) -> Result<(), Self::Error>;

    fn remove_rows(&mut self, paths: &[IndexPath], animation: Self::Animation) -> Result<(), Self::Error>;

    fn insert_rows(&mut self, paths: &[IndexPath], animation: Self::Animation) -> Result<(), Self::Error>;

    fn reload_rows(&mut self, paths: &[IndexPath], animation: Self::Animation) -> Result<(), Self::Error>;

    fn begin_updates(&mut self) {}

    fn end_updates(&mut self) {}
}

/// Open batch on a view. `end_updates` runs when the guard drops, whether the
/// batch finished, failed, or unwound.
pub struct BatchUpdate<'a, V: UpdatableView + ?Sized> {
    view: &'a mut V,
}

impl<'a, V: UpdatableView + ?Sized> BatchUpdate<'a, V> {
    pub fn begin(view: &'a mut V) -> Self {
        view.begin_updates();
        BatchUpdate { view }
    }
}

impl<V: UpdatableView + ?Sized> Deref for BatchUpdate<'_, V> {
    type Target = V;

    fn deref(&self) -> &V {
        self.view
    }
}

impl<V: UpdatableView + ?Sized> DerefMut for BatchUpdate<'_, V> {
    fn deref_mut(&mut self) -> &mut V {
        self.view
    }
}

impl<V: UpdatableView + ?Sized> Drop for BatchUpdate<'_, V> {
    fn drop(&mut self) {
        self.view.end_updates();
    }
}

/// Row transition styles of a table-like view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowAnimation {
    Fade,
    Right,
    Left,
    Top,
    Bottom,
    None,
    Middle,
    #[default]
    Automatic,
}

/// Animation style per command kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, bound(deserialize = "A: Deserialize<'de> + Default"))]
pub struct AnimationStyles<A> {
    pub update_row: A,
    pub add_row: A,
    pub remove_row: A,
    pub remove_section: A,
    pub add_section: A,
}

impl<A: Default> Default for AnimationStyles<A> {
    fn default() -> Self {
        AnimationStyles {
            update_row: A::default(),
            add_row: A::default(),
            remove_row: A::default(),
            remove_section: A::default(),
            add_section: A::default(),
        }
    }
}

impl<A: Copy> AnimationStyles<A> {
    /// The same style for every kind.
    pub fn uniform(style: A) -> Self {
        AnimationStyles {
            update_row: style,
            add_row: style,
            remove_row: style,
            remove_section: style,
            add_section: style,
        }
    }

    pub fn for_kind(&self, kind: CommandKind) -> A {
        match kind {
            CommandKind::UpdateRow => self.update_row,
            CommandKind::AddRow => self.add_row,
            CommandKind::RemoveRow => self.remove_row,
            CommandKind::RemoveSection => self.remove_section,
            CommandKind::AddSection => self.add_section,
        }
    }

    pub fn with(mut self, kind: CommandKind, style: A) -> Self {
        let slot = match kind {
            CommandKind::UpdateRow => &mut self.update_row,
            CommandKind::AddRow => &mut self.add_row,
            CommandKind::RemoveRow => &mut self.remove_row,
            CommandKind::RemoveSection => &mut self.remove_section,
            CommandKind::AddSection => &mut self.add_section,
        };
        *slot = style;
        self
    }
}

impl<A: Copy + Default> AnimationStyles<A> {
    /// Build from `(kind key, style)` pairs; kinds not named keep the default style.
    pub fn from_keyed<I, S>(pairs: I) -> Result<Self, ReconcilerError>
    where
        I: IntoIterator<Item = (S, A)>,
        S: AsRef<str>,
    {
        pairs.into_iter().try_fold(Self::default(), |styles, (key, style)| -> Result<Self, ReconcilerError> {
            let kind = CommandKind::from_key(key.as_ref())
                .ok_or_else(|| ReconcilerError::UnknownAnimationKey(key.as_ref().to_string()))?;
            Ok(styles.with(kind, style))
        })
    }
}

impl<A: DeserializeOwned + Default> AnimationStyles<A> {
    pub fn from_json(json: &str) -> Result<Self, ReconcilerError> {
        Ok(serde_json::from_str(json)?)
    }
}
