//! Board document: notes, folders and the z-index counter.

use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::BoardConfig;
use crate::drag::CommittedPosition;
use crate::folder::{self, Folder, FolderId};
use crate::grid;
use crate::note::{self, Note, NoteColor, NoteId, NoteUpdate};
use crate::selection::Selection;
use crate::storage::payload::{self, ImportError};
use crate::viewport::Viewport;

/// Errors from board mutations that reference missing records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("Note not found: {0}")]
    NoteNotFound(NoteId),
    #[error("Folder not found: {0}")]
    FolderNotFound(FolderId),
    #[error("Tag must not be empty")]
    EmptyTag,
}

pub type BoardResult<T> = Result<T, BoardError>;

/// Which notes are on screen.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BoardView {
    /// Unfiled notes, pinned notes and folder cards.
    #[default]
    Master,
    /// Notes inside one folder.
    Folder(FolderId),
}

/// Immutable copy of everything undo/redo restores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub notes: Vec<Note>,
    pub folders: Vec<Folder>,
    pub next_z_index: u64,
}

impl Default for BoardSnapshot {
    fn default() -> Self {
        Self {
            notes: Vec::new(),
            folders: Vec::new(),
            next_z_index: 1,
        }
    }
}

/// The board document plus the active view and selection.
#[derive(Debug, Clone)]
pub struct Board {
    notes: Vec<Note>,
    folders: Vec<Folder>,
    /// Next z-index to hand out; strictly increasing.
    next_z_index: u64,
    view: BoardView,
    /// Always a subset of the notes visible in `view`.
    selection: Selection,
    config: BoardConfig,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create an empty board with the default configuration.
    pub fn new() -> Self {
        Self::with_config(BoardConfig::default())
    }

    pub fn with_config(config: BoardConfig) -> Self {
        Self {
            notes: Vec::new(),
            folders: Vec::new(),
            next_z_index: 1,
            view: BoardView::Master,
            selection: Selection::new(),
            config,
        }
    }

    /// Build a board from a snapshot.
    pub fn from_snapshot(snapshot: BoardSnapshot, config: BoardConfig) -> Self {
        let mut board = Self::with_config(config);
        board.restore(snapshot);
        board
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn next_z_index(&self) -> u64 {
        self.next_z_index
    }

    pub fn view(&self) -> &BoardView {
        &self.view
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Mutable access to the selection. Ids not visible in the active view
    /// are pruned by the next board mutation.
    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    /// Folder new notes are filed into.
    fn active_folder(&self) -> Option<FolderId> {
        match &self.view {
            BoardView::Master => None,
            BoardView::Folder(id) => Some(id.clone()),
        }
    }

    /// Drop selected ids that are no longer visible in the active view.
    fn prune_selection(&mut self) {
        let notes = &self.notes;
        let view = &self.view;
        self.selection
            .retain(|id| notes.iter().any(|n| n.id == id && Self::is_visible(n, view)));
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty() && self.folders.is_empty()
    }

    /// Hand out the next z-index.
    fn allocate_z_index(&mut self) -> u64 {
        let z = self.next_z_index;
        self.next_z_index += 1;
        z
    }

    pub fn note(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    fn note_mut(&mut self, id: &str) -> BoardResult<&mut Note> {
        self.notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| BoardError::NoteNotFound(id.to_string()))
    }

    pub fn folder(&self, id: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id == id)
    }

    fn folder_mut(&mut self, id: &str) -> BoardResult<&mut Folder> {
        self.folders
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| BoardError::FolderNotFound(id.to_string()))
    }

    /// Create a note at a (grid-snapped) world position, filed into the
    /// active folder.
    pub fn create_note(&mut self, position: Point, color: NoteColor) -> &Note {
        let origin = grid::snap_point(position, self.config.grid_size);
        let size = self.config.default_note_size.max(self.config.min_note_size);
        let z_index = self.allocate_z_index();
        let mut note = Note::new(
            note::new_note_id(),
            Rect::from_origin_size(origin, (size, size)),
            color,
            z_index,
        );
        note.folder_id = self.active_folder();

        log::debug!("Created note {} at ({}, {})", note.id, note.x, note.y);
        self.notes.push(note);
        &self.notes[self.notes.len() - 1]
    }

    /// Create a note whose top-left corner is the world point under the
    /// middle of the viewport.
    pub fn create_note_at_viewport_center(&mut self, viewport: &Viewport, viewport_size: Size, color: NoteColor) -> &Note {
        self.create_note(viewport.center_world(viewport_size), color)
    }

    /// Merge a partial update into a note.
    pub fn update_note(&mut self, id: &str, update: NoteUpdate) -> BoardResult<()> {
        if let Some(Some(folder_id)) = &update.folder_id {
            if self.folder(folder_id).is_none() {
                return Err(BoardError::FolderNotFound(folder_id.clone()));
            }
        }
        let min_size = self.config.min_note_size;
        self.note_mut(id)?.apply(update, min_size);
        self.prune_selection();
        Ok(())
    }

    pub fn delete_note(&mut self, id: &str) -> BoardResult<Note> {
        let index = self
            .notes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| BoardError::NoteNotFound(id.to_string()))?;
        self.selection.remove(id);
        Ok(self.notes.remove(index))
    }

    /// Give a note a fresh z-index so it paints above every other note.
    pub fn bring_to_front(&mut self, id: &str) -> BoardResult<u64> {
        if self.note(id).is_none() {
            return Err(BoardError::NoteNotFound(id.to_string()));
        }
        let z = self.allocate_z_index();
        self.note_mut(id)?.z_index = z;
        Ok(z)
    }

    /// Flip the pinned flag. Returns the new value.
    pub fn toggle_pin(&mut self, id: &str) -> BoardResult<bool> {
        let note = self.note_mut(id)?;
        note.is_pinned = !note.is_pinned;
        let pinned = note.is_pinned;
        self.prune_selection();
        Ok(pinned)
    }

    /// Add a tag to a note. Returns false if the note already had it.
    pub fn add_tag(&mut self, id: &str, tag: &str) -> BoardResult<bool> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(BoardError::EmptyTag);
        }
        let note = self.note_mut(id)?;
        if note.has_tag(tag) {
            return Ok(false);
        }
        note.tags.push(tag.to_string());
        Ok(true)
    }

    /// Remove a tag from a note. Returns false if the note did not have it.
    pub fn remove_tag(&mut self, id: &str, tag: &str) -> BoardResult<bool> {
        let note = self.note_mut(id)?;
        let before = note.tags.len();
        note.tags.retain(|t| t != tag.trim());
        Ok(note.tags.len() != before)
    }

    pub fn notes_with_tag(&self, tag: &str) -> Vec<&Note> {
        self.notes.iter().filter(|n| n.has_tag(tag)).collect()
    }

    /// Every tag in use, sorted and deduplicated.
    pub fn all_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.notes.iter().flat_map(|n| n.tags.iter().cloned()).collect();
        tags.sort();
        tags.dedup();
        tags
    }

    /// Whether a note is shown in the given view.
    pub fn is_visible(note: &Note, view: &BoardView) -> bool {
        match view {
            BoardView::Master => note.folder_id.is_none() || note.is_pinned,
            BoardView::Folder(id) => note.folder_id.as_deref() == Some(id.as_str()),
        }
    }

    /// Notes shown in the active view, back to front.
    pub fn notes_in_view(&self) -> Vec<&Note> {
        self.notes_in(&self.view)
    }

    /// Notes shown in a view, back to front.
    pub fn notes_in(&self, view: &BoardView) -> Vec<&Note> {
        let mut notes: Vec<&Note> = self.notes.iter().filter(|n| Self::is_visible(n, view)).collect();
        notes.sort_by_key(|n| n.z_index);
        notes
    }

    /// Frontmost note in the active view containing a world point.
    pub fn note_at(&self, point: Point) -> Option<&Note> {
        self.notes
            .iter()
            .filter(|n| Self::is_visible(n, &self.view) && n.bounds().contains(point))
            .max_by_key(|n| n.z_index)
    }

    /// Create an auto-named folder laid out after the existing ones.
    pub fn create_folder(&mut self) -> &Folder {
        let name = folder::generate_folder_name(&self.folders);
        let position = folder::compute_folder_position(self.folders.len());
        let folder = Folder::new(name, position);
        log::debug!("Created folder {} ({})", folder.id, folder.name);
        self.folders.push(folder);
        &self.folders[self.folders.len() - 1]
    }

    /// Rename a folder. Blank names are ignored and return false.
    pub fn rename_folder(&mut self, id: &str, name: &str) -> BoardResult<bool> {
        let name = name.trim();
        let folder = self.folder_mut(id)?;
        if name.is_empty() {
            return Ok(false);
        }
        folder.name = name.to_string();
        Ok(true)
    }

    /// Move a folder card to a grid-snapped position.
    pub fn move_folder(&mut self, id: &str, position: Point) -> BoardResult<()> {
        let snapped = grid::snap_point(position, self.config.grid_size);
        let folder = self.folder_mut(id)?;
        folder.x = snapped.x;
        folder.y = snapped.y;
        Ok(())
    }

    /// Delete a folder. Its notes move back to the unfiled view.
    pub fn delete_folder(&mut self, id: &str) -> BoardResult<Folder> {
        let index = self
            .folders
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| BoardError::FolderNotFound(id.to_string()))?;
        let folder = self.folders.remove(index);

        let mut reparented = 0;
        for note in self.notes.iter_mut().filter(|n| n.folder_id.as_deref() == Some(id)) {
            note.folder_id = None;
            reparented += 1;
        }
        log::debug!("Deleted folder {id}; {reparented} note(s) unfiled");

        if self.view == BoardView::Folder(id.to_string()) {
            self.open_master();
        } else {
            self.prune_selection();
        }
        Ok(folder)
    }

    /// File notes into a folder (`None` = unfiled). Unknown note ids are skipped.
    /// Returns the number of notes moved.
    pub fn move_notes_to_folder<S: AsRef<str>>(&mut self, ids: &[S], folder_id: Option<&str>) -> BoardResult<usize> {
        if let Some(id) = folder_id {
            if self.folder(id).is_none() {
                return Err(BoardError::FolderNotFound(id.to_string()));
            }
        }
        let mut moved = 0;
        for note in self.notes.iter_mut() {
            if ids.iter().any(|id| id.as_ref() == note.id) {
                note.folder_id = folder_id.map(str::to_string);
                moved += 1;
            }
        }
        self.prune_selection();
        Ok(moved)
    }

    /// Show the notes of one folder. Clears the selection.
    pub fn open_folder(&mut self, id: &str) -> BoardResult<()> {
        if self.folder(id).is_none() {
            return Err(BoardError::FolderNotFound(id.to_string()));
        }
        self.view = BoardView::Folder(id.to_string());
        self.selection.clear();
        Ok(())
    }

    /// Return to the master view. Clears the selection.
    pub fn open_master(&mut self) {
        self.view = BoardView::Master;
        self.selection.clear();
    }

    /// Commit drag results. Unknown ids are skipped; returns the number applied.
    pub fn apply_positions(&mut self, positions: &[CommittedPosition]) -> usize {
        let mut applied = 0;
        for committed in positions {
            if let Ok(note) = self.note_mut(&committed.id) {
                note.set_position(committed.position);
                applied += 1;
            }
        }
        applied
    }

    /// Copy of the undoable state.
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            notes: self.notes.clone(),
            folders: self.folders.clone(),
            next_z_index: self.next_z_index,
        }
    }

    /// Replace the board contents with a snapshot.
    ///
    /// Notes smaller than the minimum size are grown to it and tied z-indexes
    /// are renumbered. The z-index counter is raised above every note's
    /// z-index so freshly allocated values stay unique.
    pub fn restore(&mut self, snapshot: BoardSnapshot) {
        let mut notes = snapshot.notes;
        let resized = clamp_note_sizes(&mut notes, self.config.min_note_size);
        if resized > 0 {
            log::warn!("Grew {resized} note(s) below the minimum size");
        }
        let renumbered = payload::renumber_duplicate_z(&mut notes);
        if renumbered > 0 {
            log::warn!("Renumbered {renumbered} note(s) with duplicate zIndex");
        }

        let highest = notes.iter().map(|n| n.z_index).max().unwrap_or(0);
        self.notes = notes;
        self.folders = snapshot.folders;
        self.next_z_index = snapshot.next_z_index.max(highest + 1);

        if let BoardView::Folder(id) = &self.view {
            if !self.folders.iter().any(|f| &f.id == id) {
                self.view = BoardView::Master;
            }
        }
        self.prune_selection();
    }

    /// Serialize the board into the export format.
    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        payload::export_board(&self.snapshot())
    }

    /// Replace the board with an exported document.
    ///
    /// On error the board is left untouched.
    pub fn import_json(&mut self, json: &str) -> Result<(), ImportError> {
        let snapshot = payload::import_board(json)?;
        self.restore(snapshot);
        self.open_master();
        Ok(())
    }

    /// Remove every note and folder and reset the z-index counter.
    pub fn clear_all(&mut self) {
        self.notes.clear();
        self.folders.clear();
        self.next_z_index = 1;
        self.open_master();
    }

    /// Bounding box of the notes in the active view.
    pub fn bounds(&self) -> Option<Rect> {
        self.notes
            .iter()
            .filter(|n| Self::is_visible(n, &self.view))
            .map(Note::bounds)
            .reduce(|a, b| a.union(b))
    }
}

fn clamp_note_sizes(notes: &mut [Note], min_size: f64) -> usize {
    let mut resized = 0;
    for note in notes.iter_mut() {
        let width = note.width.max(min_size);
        let height = note.height.max(min_size);
        if width != note.width || height != note.height {
            note.width = width;
            note.height = height;
            resized += 1;
        }
    }
    resized
}
