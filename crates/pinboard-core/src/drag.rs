//! Group dragging of notes.
//!
//! A drag captures the origin of every participating note at drag start.
//! Live movement produces preview positions (origin + delta) without touching
//! the note records; grid snapping is applied only when the drag ends.

use kurbo::{Point, Vec2};
use std::collections::HashMap;

use crate::grid::{self, GRID_SIZE};
use crate::note::{Note, NoteId};
use crate::selection::Selection;

/// State of an in-progress drag.
#[derive(Debug, Clone)]
pub struct DragSession {
    /// Note under the pointer when the drag started.
    pub anchor: NoteId,
    /// Pre-drag position of every participating note.
    pub origins: HashMap<NoteId, Point>,
}

impl DragSession {
    /// Ids of the notes being moved.
    pub fn note_ids(&self) -> Vec<NoteId> {
        self.origins.keys().cloned().collect()
    }

    /// Delta of the anchor relative to where it started.
    fn delta_for(&self, id: &str, anchor_position: Point) -> Option<Vec2> {
        let origin = self.origins.get(&self.anchor).or_else(|| self.origins.get(id))?;
        Some(anchor_position - *origin)
    }
}

/// Final position committed for one note at drag end.
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedPosition {
    pub id: NoteId,
    pub position: Point,
}

/// Moves a set of notes together, preserving their relative offsets.
#[derive(Debug, Clone)]
pub struct GroupDragController {
    session: Option<DragSession>,
    preview: HashMap<NoteId, Point>,
    grid_size: f64,
}

impl Default for GroupDragController {
    fn default() -> Self {
        Self::with_grid_size(GRID_SIZE)
    }
}

impl GroupDragController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a controller that snaps committed positions to `grid_size`.
    pub fn with_grid_size(grid_size: f64) -> Self {
        Self {
            session: None,
            preview: HashMap::new(),
            grid_size,
        }
    }

    /// Start a drag on `anchor`.
    ///
    /// The whole selection moves when it contains the anchor and has more than
    /// one member; otherwise only the anchor moves. Any previous session is
    /// replaced. Ids with no matching note are skipped.
    pub fn begin<'a, I>(&mut self, anchor: &str, selection: &Selection, notes: I)
    where
        I: IntoIterator<Item = &'a Note>,
    {
        let group = selection.len() > 1 && selection.contains(anchor);

        let origins: HashMap<NoteId, Point> = notes
            .into_iter()
            .filter(|note| {
                if group {
                    selection.contains(&note.id)
                } else {
                    note.id == anchor
                }
            })
            .map(|note| (note.id.clone(), note.position()))
            .collect();

        log::debug!("Drag started on {anchor} with {} note(s)", origins.len());

        self.preview.clear();
        self.session = Some(DragSession {
            anchor: anchor.to_string(),
            origins,
        });
    }

    /// Move the drag so that the anchor sits at `anchor_position`.
    ///
    /// Events for a note other than the session's anchor are ignored and
    /// return `None`. Otherwise returns the preview position of every
    /// participating note.
    pub fn drag(&mut self, anchor: &str, anchor_position: Point) -> Option<&HashMap<NoteId, Point>> {
        let session = self.session.as_ref()?;
        if session.anchor != anchor {
            log::debug!("Ignoring drag event for {anchor}; session anchor is {}", session.anchor);
            return None;
        }
        let delta = session.delta_for(anchor, anchor_position)?;

        self.preview = session
            .origins
            .iter()
            .map(|(id, origin)| (id.clone(), *origin + delta))
            .collect();
        Some(&self.preview)
    }

    /// Finish the drag with the dropped note at `final_position`.
    ///
    /// Every participant is committed at its grid-snapped `origin + delta`.
    /// If `id` is not part of the session (or no session exists) the drag is
    /// out of sync: only `id` is committed, at the literal `final_position`.
    /// The session and preview are cleared in all cases.
    pub fn end(&mut self, id: &str, final_position: Point) -> Vec<CommittedPosition> {
        let session = self.session.take();
        self.preview.clear();

        let Some(session) = session.filter(|s| s.origins.contains_key(id)) else {
            log::warn!("Drag end for {id} without a matching session; committing literal position");
            return vec![CommittedPosition {
                id: id.to_string(),
                position: final_position,
            }];
        };

        let Some(delta) = session.delta_for(id, final_position) else {
            return Vec::new();
        };

        let mut committed: Vec<CommittedPosition> = session
            .origins
            .iter()
            .map(|(note_id, origin)| {
                let moved = *origin + delta;
                CommittedPosition {
                    id: note_id.clone(),
                    position: grid::snap_point(moved, self.grid_size),
                }
            })
            .collect();
        committed.sort_by(|a, b| a.id.cmp(&b.id));

        log::debug!("Drag ended on {id}; committed {} position(s)", committed.len());
        committed
    }

    /// Abandon the drag without committing anything.
    pub fn cancel(&mut self) {
        self.session = None;
        self.preview.clear();
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Preview position for a note, if it is part of the live drag.
    pub fn preview_position(&self, id: &str) -> Option<Point> {
        self.preview.get(id).copied()
    }

    pub fn preview(&self) -> &HashMap<NoteId, Point> {
        &self.preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::NoteColor;
    use kurbo::Rect;
    use pretty_assertions::assert_eq;

    fn note(id: &str, x: f64, y: f64) -> Note {
        Note::new(id, Rect::new(x, y, x + 240.0, y + 240.0), NoteColor::default(), 1)
    }

    fn board() -> Vec<Note> {
        vec![note("a", 0.0, 0.0), note("b", 300.0, 40.0), note("c", 600.0, 600.0)]
    }

    fn position_of(committed: &[CommittedPosition], id: &str) -> Point {
        committed.iter().find(|c| c.id == id).map(|c| c.position).unwrap()
    }

    #[test]
    fn test_single_note_when_anchor_not_selected() {
        let notes = board();
        let mut selection = Selection::new();
        selection.select_many(["b", "c"]);

        let mut drag = GroupDragController::new();
        drag.begin("a", &selection, &notes);
        assert_eq!(drag.session().unwrap().note_ids(), vec!["a".to_string()]);
    }

    #[test]
    fn test_single_note_when_selection_is_just_anchor() {
        let notes = board();
        let mut selection = Selection::new();
        selection.select_only("a");

        let mut drag = GroupDragController::new();
        drag.begin("a", &selection, &notes);
        assert_eq!(drag.session().unwrap().origins.len(), 1);
    }

    #[test]
    fn test_group_preview_preserves_offsets() {
        let notes = board();
        let mut selection = Selection::new();
        selection.select_many(["a", "b"]);

        let mut drag = GroupDragController::new();
        drag.begin("a", &selection, &notes);
        let preview = drag.drag("a", Point::new(13.0, 7.0)).unwrap();

        assert_eq!(preview.len(), 2);
        assert_eq!(preview["a"], Point::new(13.0, 7.0));
        assert_eq!(preview["b"], Point::new(313.0, 47.0));
        // Preview is display-only: the note records are untouched.
        assert_eq!(notes[1].position(), Point::new(300.0, 40.0));
    }

    #[test]
    fn test_drag_from_other_note_is_ignored() {
        let notes = board();
        let mut selection = Selection::new();
        selection.select_many(["a", "b"]);

        let mut drag = GroupDragController::new();
        drag.begin("a", &selection, &notes);
        assert!(drag.drag("b", Point::new(50.0, 50.0)).is_none());
        assert!(drag.preview().is_empty());
    }

    #[test]
    fn test_end_snaps_each_participant() {
        let notes = vec![note("a", 0.0, 0.0), note("b", 305.0, 47.0)];
        let mut selection = Selection::new();
        selection.select_many(["a", "b"]);

        let mut drag = GroupDragController::new();
        drag.begin("a", &selection, &notes);
        drag.drag("a", Point::new(20.0, 15.0));
        let committed = drag.end("a", Point::new(22.0, 18.0));

        assert_eq!(position_of(&committed, "a"), Point::new(20.0, 20.0));
        // 305 + 22 = 327 -> 320, 47 + 18 = 65 -> 60
        assert_eq!(position_of(&committed, "b"), Point::new(320.0, 60.0));
        assert!(!drag.is_dragging());
        assert!(drag.preview().is_empty());
    }

    #[test]
    fn test_end_from_non_anchor_participant_uses_anchor_origin() {
        let notes = board();
        let mut selection = Selection::new();
        selection.select_many(["a", "b"]);

        let mut drag = GroupDragController::new();
        drag.begin("a", &selection, &notes);
        let committed = drag.end("b", Point::new(40.0, 40.0));

        assert_eq!(position_of(&committed, "a"), Point::new(40.0, 40.0));
        assert_eq!(position_of(&committed, "b"), Point::new(340.0, 80.0));
    }

    #[test]
    fn test_end_without_session_commits_literal_position() {
        let mut drag = GroupDragController::new();
        let committed = drag.end("a", Point::new(13.0, 27.0));
        assert_eq!(
            committed,
            vec![CommittedPosition {
                id: "a".to_string(),
                position: Point::new(13.0, 27.0),
            }]
        );
    }

    #[test]
    fn test_end_for_unknown_id_commits_only_that_note() {
        let notes = board();
        let mut selection = Selection::new();
        selection.select_many(["a", "b"]);

        let mut drag = GroupDragController::new();
        drag.begin("a", &selection, &notes);
        let committed = drag.end("zzz", Point::new(5.0, 5.0));
        assert_eq!(committed.len(), 1);
        assert_eq!(committed[0].position, Point::new(5.0, 5.0));
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_new_begin_replaces_session() {
        let notes = board();
        let selection = Selection::new();

        let mut drag = GroupDragController::new();
        drag.begin("a", &selection, &notes);
        drag.begin("c", &selection, &notes);
        assert_eq!(drag.session().unwrap().anchor, "c");
        assert!(drag.drag("a", Point::ZERO).is_none());
    }

    #[test]
    fn test_relative_offsets_within_one_grid_unit() {
        let notes = vec![note("a", 3.0, 11.0), note("b", 257.0, -33.0), note("c", -71.0, 140.0)];
        let mut selection = Selection::new();
        selection.select_many(["a", "b", "c"]);

        for (dx, dy) in [(1.0, 1.0), (9.9, -10.1), (-123.4, 56.7), (10.0, 30.0)] {
            let mut drag = GroupDragController::new();
            drag.begin("a", &selection, &notes);
            let committed = drag.end("a", Point::new(3.0 + dx, 11.0 + dy));
            for first in &notes {
                for second in &notes {
                    let fa = position_of(&committed, &first.id);
                    let fb = position_of(&committed, &second.id);
                    let before = first.position() - second.position();
                    let after = fa - fb;
                    assert!((after.x - before.x).abs() <= GRID_SIZE);
                    assert!((after.y - before.y).abs() <= GRID_SIZE);
                }
            }
        }
    }
}
