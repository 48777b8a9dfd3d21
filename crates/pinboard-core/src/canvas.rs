//! Runtime canvas: routes pointer input through the viewport, selection,
//! group drag, alignment and grid snapping, and records history.

use kurbo::{Point, Rect, Size, Vec2};

use crate::alignment::{self, AlignmentGuide};
use crate::board::{Board, BoardSnapshot};
use crate::config::BoardConfig;
use crate::drag::GroupDragController;
use crate::history::HistoryRecorder;
use crate::note::{Note, NoteColor, NoteId, NoteUpdate};
use crate::resize::{ResizeHandle, ResizeSession};
use crate::selection::SelectionBox;
use crate::viewport::Viewport;

/// What the pointer is currently doing.
#[derive(Debug, Clone, Default)]
pub enum Interaction {
    #[default]
    Idle,
    /// Moving notes. `grab_offset` is the pointer's offset from the anchor's
    /// top-left corner in world units.
    Dragging { anchor: NoteId, grab_offset: Vec2, position: Point },
    Resizing { session: ResizeSession, bounds: Rect },
    /// Rubber-band selection in world coordinates.
    Marquee(SelectionBox),
    /// Panning; `last` is the previous pointer position in screen space.
    Panning { last: Point },
}

/// Runtime canvas state (not persisted).
#[derive(Debug, Clone)]
pub struct Canvas {
    board: Board,
    /// Pan/zoom of the visible area.
    pub viewport: Viewport,
    /// Size of the visible area in screen units.
    pub viewport_size: Size,
    drag: GroupDragController,
    history: HistoryRecorder,
    interaction: Interaction,
    guides: Vec<AlignmentGuide>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    /// Create a canvas with an empty board and the default configuration.
    pub fn new() -> Self {
        Self::with_board(Board::new())
    }

    /// Create a canvas over an existing board. History starts at its current state.
    pub fn with_board(board: Board) -> Self {
        let config = board.config().clone();
        let mut history = HistoryRecorder::from_config(&config);
        history.initialize(&board.snapshot());
        Self {
            viewport: Viewport::from_config(&config),
            viewport_size: Size::new(800.0, 600.0),
            drag: GroupDragController::with_grid_size(config.grid_size),
            history,
            interaction: Interaction::Idle,
            guides: Vec::new(),
            board,
        }
    }

    /// Create a canvas from a loaded snapshot.
    pub fn from_snapshot(snapshot: BoardSnapshot, config: BoardConfig) -> Self {
        Self::with_board(Board::from_snapshot(snapshot, config))
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn config(&self) -> &BoardConfig {
        self.board.config()
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn history(&self) -> &HistoryRecorder {
        &self.history
    }

    /// Set the viewport size.
    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.viewport_size = Size::new(width, height);
    }

    /// Mutate the board. A change to notes, folders or the z-index counter is
    /// reported to the history recorder.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut Board) -> R) -> R {
        let before = self.board.snapshot();
        let result = f(&mut self.board);
        let after = self.board.snapshot();
        if after != before {
            self.history.record_change(after);
        }
        result
    }

    /// Add a note at the centre of the visible area.
    pub fn add_note(&mut self, color: NoteColor) -> NoteId {
        let (viewport, size) = (self.viewport.clone(), self.viewport_size);
        self.edit(|board| board.create_note_at_viewport_center(&viewport, size, color).id.clone())
    }

    /// Delete every selected note. Returns how many were removed.
    pub fn delete_selected(&mut self) -> usize {
        let ids = self.board.selection().sorted_ids();
        self.edit(|board| ids.iter().filter(|id| board.delete_note(id).is_ok()).count())
    }

    /// Press on a note.
    ///
    /// With shift the note's selection is toggled and nothing moves. Otherwise
    /// an unselected note becomes the only selection, is brought to the front,
    /// and a drag starts (of the whole selection if the note is part of it).
    /// Returns false if no visible note has that id.
    pub fn pointer_down_note(&mut self, id: &str, screen: Point, shift: bool) -> bool {
        let visible = self
            .board
            .note(id)
            .is_some_and(|note| Board::is_visible(note, self.board.view()));
        if !visible {
            return false;
        }

        if shift {
            self.board.selection_mut().toggle(id);
            return true;
        }
        if !self.board.selection().contains(id) {
            self.board.selection_mut().select_only(id);
        }
        self.edit(|board| board.bring_to_front(id).ok());

        let Some(origin) = self.board.note(id).map(Note::position) else {
            return false;
        };
        let world = self.viewport.screen_to_world(screen);
        let visible_notes = self.board.notes_in_view();
        self.drag.begin(id, self.board.selection(), visible_notes);
        self.interaction = Interaction::Dragging {
            anchor: id.to_string(),
            grab_offset: world - origin,
            position: origin,
        };
        true
    }

    /// Press on empty canvas: start a marquee. Without shift the selection is cleared.
    pub fn pointer_down_background(&mut self, screen: Point, shift: bool) {
        if !shift {
            self.board.selection_mut().clear();
        }
        self.interaction = Interaction::Marquee(SelectionBox::new(self.viewport.screen_to_world(screen)));
    }

    /// Start panning the view.
    pub fn begin_pan(&mut self, screen: Point) {
        self.interaction = Interaction::Panning { last: screen };
    }

    /// Press on a resize handle of a note.
    pub fn begin_resize(&mut self, id: &str, handle: ResizeHandle, screen: Point) -> bool {
        let Some(bounds) = self.board.note(id).map(Note::bounds) else {
            return false;
        };
        self.edit(|board| board.bring_to_front(id).ok());
        let session = ResizeSession::new(id, handle, self.viewport.screen_to_world(screen), bounds);
        self.interaction = Interaction::Resizing { session, bounds };
        true
    }

    /// Pointer moved to `screen`.
    pub fn pointer_move(&mut self, screen: Point) {
        let world = self.viewport.screen_to_world(screen);

        if let Interaction::Dragging { anchor, grab_offset, .. } = &self.interaction {
            let anchor = anchor.clone();
            let target = world - *grab_offset;
            let aligned = self.align_drag(&anchor, target);
            if let Interaction::Dragging { position, .. } = &mut self.interaction {
                *position = aligned;
            }
            self.drag.drag(&anchor, aligned);
            return;
        }

        match &mut self.interaction {
            Interaction::Idle | Interaction::Dragging { .. } => {}
            Interaction::Resizing { session, bounds } => {
                let config = self.board.config();
                *bounds = session.bounds_at(world, config.min_note_size, config.grid_size);
            }
            Interaction::Marquee(selection_box) => selection_box.update(world),
            Interaction::Panning { last } => {
                let delta = screen - *last;
                *last = screen;
                self.viewport.pan_by(delta);
            }
        }
    }

    /// Snap the dragged anchor to peers that are not part of the drag.
    fn align_drag(&mut self, anchor: &str, target: Point) -> Point {
        let Some(size) = self.board.note(anchor).map(Note::size) else {
            return target;
        };
        let moving = self.drag.session().map(|s| s.origins.clone()).unwrap_or_default();
        let peers: Vec<&Note> = self
            .board
            .notes_in_view()
            .into_iter()
            .filter(|n| !moving.contains_key(&n.id))
            .collect();

        let moving = Rect::from_origin_size(target, size);
        let snapped = alignment::apply_snapping(moving, peers, self.board.config().alignment_threshold);
        self.guides = snapped.guides;
        snapped.position
    }

    /// Pointer released at `screen`; commits the current interaction.
    pub fn pointer_up(&mut self, screen: Point) {
        self.pointer_move(screen);
        match std::mem::take(&mut self.interaction) {
            Interaction::Idle | Interaction::Panning { .. } => {}
            Interaction::Dragging { anchor, position, .. } => {
                let committed = self.drag.end(&anchor, position);
                self.edit(|board| board.apply_positions(&committed));
            }
            Interaction::Resizing { session, bounds } => {
                self.edit(|board| board.update_note(&session.id, NoteUpdate::bounds(bounds)).ok());
            }
            Interaction::Marquee(selection_box) => {
                if selection_box.is_significant(self.board.config().min_marquee_size) {
                    let hits = selection_box.hits(self.board.notes_in_view());
                    self.board.selection_mut().select_many(hits);
                }
            }
        }
        self.guides.clear();
    }

    /// Abandon the current interaction without committing anything.
    pub fn cancel_interaction(&mut self) {
        self.drag.cancel();
        self.interaction = Interaction::Idle;
        self.guides.clear();
    }

    /// Zoom toward the cursor in response to a wheel event.
    pub fn wheel(&mut self, screen: Point, delta_y: f64) {
        self.viewport.zoom_wheel(screen, delta_y);
    }

    /// Alignment guides for the current drag.
    pub fn guides(&self) -> &[AlignmentGuide] {
        &self.guides
    }

    /// Live marquee rectangle in world coordinates.
    pub fn marquee(&self) -> Option<Rect> {
        match &self.interaction {
            Interaction::Marquee(selection_box) => Some(selection_box.rect()),
            _ => None,
        }
    }

    /// Bounds a note should be drawn at, including any live drag or resize preview.
    pub fn display_bounds(&self, id: &str) -> Option<Rect> {
        let note = self.board.note(id)?;
        if let Interaction::Resizing { session, bounds } = &self.interaction {
            if session.id == id {
                return Some(*bounds);
            }
        }
        let origin = self.drag.preview_position(id).unwrap_or_else(|| note.position());
        Some(Rect::from_origin_size(origin, note.size()))
    }

    /// Commit the pending history entry if its quiet period has elapsed.
    pub fn tick(&mut self) -> bool {
        self.history.poll()
    }

    /// Commit the pending history entry now.
    pub fn flush_history(&mut self) -> bool {
        self.history.flush()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Restore the previous history state. Returns false if there is none.
    pub fn undo(&mut self) -> bool {
        self.cancel_interaction();
        match self.history.undo() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    /// Restore the next history state. Returns false if there is none.
    pub fn redo(&mut self) -> bool {
        self.cancel_interaction();
        match self.history.redo() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, snapshot: BoardSnapshot) {
        self.board.restore(snapshot);
        // Swallowed by the recorder's restore guard.
        self.history.record_change(self.board.snapshot());
    }

    /// Replace the board with a freshly loaded snapshot and restart history.
    pub fn load(&mut self, snapshot: BoardSnapshot) {
        self.cancel_interaction();
        self.board.restore(snapshot);
        self.board.open_master();
        self.history.initialize(&self.board.snapshot());
    }

    /// Fit the view to show all notes in the active view.
    pub fn fit_to_content(&mut self, padding: f64) {
        let Some(bounds) = self.board.bounds() else {
            return;
        };
        let available = Size::new(
            (self.viewport_size.width - padding * 2.0).max(1.0),
            (self.viewport_size.height - padding * 2.0).max(1.0),
        );
        let zoom = (available.width / bounds.width()).min(available.height / bounds.height());
        self.viewport.set_zoom(zoom);
        let center = bounds.center();
        let zoom = self.viewport.zoom;
        self.viewport.pan = Vec2::new(
            self.viewport_size.width / 2.0 - center.x * zoom,
            self.viewport_size.height / 2.0 - center.y * zoom,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn canvas_with_notes(positions: &[(f64, f64)]) -> (Canvas, Vec<NoteId>) {
        let mut canvas = Canvas::new();
        let ids = positions
            .iter()
            .map(|&(x, y)| canvas.edit(|b| b.create_note(Point::new(x, y), NoteColor::default()).id.clone()))
            .collect();
        canvas.flush_history();
        (canvas, ids)
    }

    fn position(canvas: &Canvas, id: &str) -> Point {
        canvas.board().note(id).unwrap().position()
    }

    #[test]
    fn test_click_selects_and_brings_to_front() {
        let (mut canvas, ids) = canvas_with_notes(&[(0.0, 0.0), (100.0, 100.0)]);
        assert!(canvas.pointer_down_note(&ids[0], Point::new(10.0, 10.0), false));
        assert_eq!(canvas.board().selection().sorted_ids(), vec![ids[0].clone()]);
        assert_eq!(canvas.board().notes_in_view().last().unwrap().id, ids[0]);
        canvas.pointer_up(Point::new(10.0, 10.0));
        assert_eq!(position(&canvas, &ids[0]), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_shift_click_toggles_without_dragging() {
        let (mut canvas, ids) = canvas_with_notes(&[(0.0, 0.0), (400.0, 0.0)]);
        canvas.pointer_down_note(&ids[0], Point::new(10.0, 10.0), false);
        canvas.pointer_up(Point::new(10.0, 10.0));
        canvas.pointer_down_note(&ids[1], Point::new(410.0, 10.0), true);
        assert!(matches!(canvas.interaction(), Interaction::Idle));
        assert_eq!(canvas.board().selection().len(), 2);
        canvas.pointer_down_note(&ids[1], Point::new(410.0, 10.0), true);
        assert_eq!(canvas.board().selection().len(), 1);
    }

    #[test]
    fn test_group_drag_moves_selection_and_snaps() {
        let (mut canvas, ids) = canvas_with_notes(&[(0.0, 0.0), (400.0, 0.0), (0.0, 600.0)]);
        canvas.board.selection_mut().select_many([ids[0].clone(), ids[1].clone()]);

        canvas.pointer_down_note(&ids[0], Point::new(10.0, 10.0), false);
        canvas.pointer_move(Point::new(60.0, 131.0));
        assert_eq!(canvas.display_bounds(&ids[1]).unwrap().origin(), Point::new(450.0, 121.0));
        canvas.pointer_up(Point::new(60.0, 131.0));

        assert_eq!(position(&canvas, &ids[0]), Point::new(60.0, 120.0));
        assert_eq!(position(&canvas, &ids[1]), Point::new(460.0, 120.0));
        assert_eq!(position(&canvas, &ids[2]), Point::new(0.0, 600.0));
    }

    #[test]
    fn test_drag_aligns_to_peer_edge() {
        let (mut canvas, ids) = canvas_with_notes(&[(0.0, 0.0), (500.0, 0.0)]);
        // Grab A at its origin and bring its right edge 3px short of B's left edge.
        canvas.pointer_down_note(&ids[0], Point::new(0.0, 0.0), false);
        canvas.pointer_move(Point::new(257.0, 300.0));
        assert!(!canvas.guides().is_empty());
        assert_eq!(canvas.display_bounds(&ids[0]).unwrap().x1, 500.0);
        canvas.pointer_up(Point::new(257.0, 300.0));
        assert!(canvas.guides().is_empty());
        assert_eq!(position(&canvas, &ids[0]), Point::new(260.0, 300.0));
    }

    #[test]
    fn test_marquee_selects_intersecting_notes() {
        let (mut canvas, ids) = canvas_with_notes(&[(0.0, 0.0), (400.0, 0.0), (0.0, 600.0)]);
        canvas.pointer_down_background(Point::new(-20.0, -20.0), false);
        canvas.pointer_move(Point::new(450.0, 100.0));
        assert!(canvas.marquee().is_some());
        canvas.pointer_up(Point::new(450.0, 100.0));
        assert_eq!(canvas.board().selection().len(), 2);
        assert!(!canvas.board().selection().contains(&ids[2]));
    }

    #[test]
    fn test_tiny_marquee_selects_nothing() {
        let (mut canvas, _) = canvas_with_notes(&[(0.0, 0.0)]);
        canvas.pointer_down_background(Point::new(5.0, 5.0), false);
        canvas.pointer_up(Point::new(12.0, 40.0));
        assert!(canvas.board().selection().is_empty());
    }

    #[test]
    fn test_resize_commits_snapped_bounds() {
        let (mut canvas, ids) = canvas_with_notes(&[(0.0, 0.0)]);
        assert!(canvas.begin_resize(&ids[0], ResizeHandle::SE, Point::new(240.0, 240.0)));
        canvas.pointer_move(Point::new(291.0, 100.0));
        assert_eq!(canvas.display_bounds(&ids[0]), Some(Rect::new(0.0, 0.0, 300.0, 160.0)));
        canvas.pointer_up(Point::new(291.0, 100.0));
        assert_eq!(canvas.board().note(&ids[0]).unwrap().bounds(), Rect::new(0.0, 0.0, 300.0, 160.0));
    }

    #[test]
    fn test_pan_and_wheel() {
        let mut canvas = Canvas::new();
        canvas.begin_pan(Point::new(100.0, 100.0));
        canvas.pointer_move(Point::new(130.0, 90.0));
        canvas.pointer_up(Point::new(130.0, 90.0));
        assert_eq!(canvas.viewport.pan, Vec2::new(30.0, -10.0));

        let cursor = Point::new(400.0, 300.0);
        let before = canvas.viewport.screen_to_world(cursor);
        canvas.wheel(cursor, -200.0);
        assert!((canvas.viewport.zoom - 1.2).abs() < 1e-9);
        let after = canvas.viewport.screen_to_world(cursor);
        assert!((before - after).hypot() < 1e-9);
    }

    #[test]
    fn test_undo_redo_drag() {
        let (mut canvas, ids) = canvas_with_notes(&[(0.0, 0.0)]);
        canvas.pointer_down_note(&ids[0], Point::new(0.0, 0.0), false);
        canvas.pointer_up(Point::new(200.0, 200.0));
        assert_eq!(position(&canvas, &ids[0]), Point::new(200.0, 200.0));

        assert!(canvas.undo());
        assert_eq!(position(&canvas, &ids[0]), Point::new(0.0, 0.0));
        assert!(!canvas.history().has_pending());
        assert!(canvas.redo());
        assert_eq!(position(&canvas, &ids[0]), Point::new(200.0, 200.0));
    }

    #[test]
    fn test_noop_edit_records_nothing() {
        let (mut canvas, ids) = canvas_with_notes(&[(0.0, 0.0)]);
        canvas.edit(|board| board.remove_tag(&ids[0], "absent").ok());
        assert!(!canvas.history().has_pending());
    }

    #[test]
    fn test_delete_selected() {
        let (mut canvas, ids) = canvas_with_notes(&[(0.0, 0.0), (400.0, 0.0)]);
        canvas.board.selection_mut().select_many(ids.clone());
        assert_eq!(canvas.delete_selected(), 2);
        assert!(canvas.board().notes().is_empty());
        assert!(canvas.board().selection().is_empty());
    }

    #[test]
    fn test_notes_in_other_views_are_not_interactive() {
        let (mut canvas, ids) = canvas_with_notes(&[(0.0, 0.0)]);
        let folder = canvas.edit(|b| b.create_folder().id.clone());
        canvas.edit(|b| b.move_notes_to_folder(&ids, Some(folder.as_str()))).unwrap();
        assert!(!canvas.pointer_down_note(&ids[0], Point::ZERO, false));
    }

    #[test]
    fn test_fit_to_content_centres_notes() {
        let (mut canvas, _) = canvas_with_notes(&[(0.0, 0.0), (400.0, 0.0)]);
        canvas.set_viewport_size(1000.0, 600.0);
        canvas.fit_to_content(50.0);
        let center = canvas.viewport.world_to_screen(Point::new(320.0, 120.0));
        assert!((center.x - 500.0).abs() < 1e-9);
        assert!((center.y - 300.0).abs() < 1e-9);
    }
}
