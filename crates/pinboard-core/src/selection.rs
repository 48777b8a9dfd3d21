//! Note selection and marquee (rubber-band) selection.

use kurbo::{Point, Rect};
use std::collections::HashSet;

use crate::note::{Note, NoteId};

/// Set of selected note ids.
///
/// The owner keeps it a subset of the notes visible in the active view by
/// calling [`Selection::retain`] whenever the view or the note set changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: HashSet<NoteId>,
}

impl Selection {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shift-click: add the id if absent, remove it if present.
    pub fn toggle(&mut self, id: &str) {
        if !self.ids.remove(id) {
            self.ids.insert(id.to_string());
        }
    }

    /// Plain click: the selection becomes exactly `{id}`.
    pub fn select_only(&mut self, id: &str) {
        self.ids.clear();
        self.ids.insert(id.to_string());
    }

    /// Marquee selection: add every id, keeping the existing selection.
    pub fn select_many<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<NoteId>,
    {
        self.ids.extend(ids.into_iter().map(Into::into));
    }

    /// Remove a single id (e.g. after the note was deleted).
    pub fn remove(&mut self, id: &str) {
        self.ids.remove(id);
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Drop every id for which `is_visible` returns false.
    pub fn retain<F>(&mut self, mut is_visible: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.ids.retain(|id| is_visible(id));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &HashSet<NoteId> {
        &self.ids
    }

    /// Selected ids in a stable (sorted) order.
    pub fn sorted_ids(&self) -> Vec<NoteId> {
        let mut ids: Vec<NoteId> = self.ids.iter().cloned().collect();
        ids.sort();
        ids
    }
}

/// A marquee drawn by dragging on empty board space, in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionBox {
    pub start: Point,
    pub end: Point,
}

impl SelectionBox {
    /// Start a marquee at a world point.
    pub fn new(start: Point) -> Self {
        Self { start, end: start }
    }

    /// Move the free corner.
    pub fn update(&mut self, end: Point) {
        self.end = end;
    }

    /// Normalized rectangle spanned by the two corners.
    pub fn rect(&self) -> Rect {
        Rect::from_points(self.start, self.end)
    }

    /// Whether the marquee is large enough to count as a selection gesture.
    /// Both sides must be strictly larger than `min_size`.
    pub fn is_significant(&self, min_size: f64) -> bool {
        let rect = self.rect();
        rect.width() > min_size && rect.height() > min_size
    }

    /// Ids of notes whose bounds strictly intersect the marquee.
    pub fn hits<'a, I>(&self, notes: I) -> Vec<NoteId>
    where
        I: IntoIterator<Item = &'a Note>,
    {
        let rect = self.rect();
        notes
            .into_iter()
            .filter(|note| {
                let b = note.bounds();
                b.x0 < rect.x1 && b.x1 > rect.x0 && b.y0 < rect.y1 && b.y1 > rect.y0
            })
            .map(|note| note.id.clone())
            .collect()
    }
}
