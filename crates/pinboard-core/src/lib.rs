//! Pinboard Core Library
//!
//! Platform-agnostic state and interaction logic for a zoomable note board:
//! grid snapping, viewport transforms, selection, group dragging, alignment
//! guides, undo/redo history and JSON persistence.

pub mod alignment;
pub mod board;
pub mod canvas;
pub mod config;
pub mod drag;
pub mod folder;
pub mod grid;
pub mod history;
pub mod note;
pub mod resize;
pub mod selection;
pub mod storage;
pub mod viewport;

pub use alignment::{AlignmentGuide, AlignmentKind, AlignmentResult, GuideOrientation, SnappedPosition};
pub use board::{Board, BoardError, BoardSnapshot, BoardView};
pub use canvas::{Canvas, Interaction};
pub use config::BoardConfig;
pub use drag::{CommittedPosition, DragSession, GroupDragController};
pub use folder::{Folder, FolderId, compute_folder_position, generate_folder_name};
pub use grid::{GRID_SIZE, snap, snap_point};
pub use history::{HistoryManager, HistoryRecorder};
pub use note::{Note, NoteColor, NoteId, NoteUpdate};
pub use resize::{ResizeHandle, ResizeSession, apply_resize};
pub use selection::{Selection, SelectionBox};
pub use storage::{BoardStore, ImportError, KeyValueStore, MemoryStorage, StorageError, StorageResult};
pub use viewport::{ViewTransform, Viewport, screen_to_world, world_to_screen, zoom_at};

#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStorage;

#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorage;
