//! Note records.

use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::folder::FolderId;

/// Unique note identifier.
pub type NoteId = String;

/// Generate a fresh note identifier.
pub fn new_note_id() -> NoteId {
    Uuid::new_v4().to_string()
}

/// Palette of note colors.
///
/// Serialized as the hex string the palette entry renders with. Unknown
/// strings from older payloads fall back to the default color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NoteColor {
    #[default]
    Black,
    Green,
    Red,
    Blue,
}

impl NoteColor {
    /// All palette entries, in toolbar order.
    pub const ALL: [NoteColor; 4] = [NoteColor::Black, NoteColor::Green, NoteColor::Red, NoteColor::Blue];

    /// Hex representation of this color.
    pub fn hex(self) -> &'static str {
        match self {
            NoteColor::Black => "#1d1d1f",
            NoteColor::Green => "#34c759",
            NoteColor::Red => "#ff3b30",
            NoteColor::Blue => "#007aff",
        }
    }

    /// Look up a palette entry by hex string (case-insensitive).
    pub fn from_hex(hex: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|color| color.hex().eq_ignore_ascii_case(hex.trim()))
    }
}

impl From<String> for NoteColor {
    fn from(value: String) -> Self {
        Self::from_hex(&value).unwrap_or_else(|| {
            log::warn!("Unknown note color {value:?}, using default");
            NoteColor::default()
        })
    }
}

impl From<NoteColor> for String {
    fn from(color: NoteColor) -> Self {
        color.hex().to_string()
    }
}

/// A note on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    /// Left edge in world units.
    pub x: f64,
    /// Top edge in world units.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub color: NoteColor,
    /// Paint and interaction order; higher is in front.
    pub z_index: u64,
    /// Containing folder (`None` = unfiled).
    #[serde(default)]
    pub folder_id: Option<FolderId>,
    /// Pinned notes stay visible in the master view.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_pinned: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Note {
    /// Create an unfiled note with an empty title and body.
    pub fn new(id: impl Into<NoteId>, bounds: Rect, color: NoteColor, z_index: u64) -> Self {
        Self {
            id: id.into(),
            x: bounds.x0,
            y: bounds.y0,
            width: bounds.width(),
            height: bounds.height(),
            title: String::new(),
            content: String::new(),
            color,
            z_index,
            folder_id: None,
            is_pinned: false,
            tags: Vec::new(),
        }
    }

    /// Top-left corner.
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set_position(&mut self, position: Point) {
        self.x = position.x;
        self.y = position.y;
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Bounding rectangle in world coordinates.
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position(), self.size())
    }

    /// Check whether the note carries a tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Merge a partial update into this note.
    ///
    /// Sizes are clamped to `min_size`.
    pub fn apply(&mut self, update: NoteUpdate, min_size: f64) {
        if let Some(x) = update.x {
            self.x = x;
        }
        if let Some(y) = update.y {
            self.y = y;
        }
        if let Some(width) = update.width {
            self.width = width.max(min_size);
        }
        if let Some(height) = update.height {
            self.height = height.max(min_size);
        }
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(content) = update.content {
            self.content = content;
        }
        if let Some(color) = update.color {
            self.color = color;
        }
        if let Some(folder_id) = update.folder_id {
            self.folder_id = folder_id;
        }
        if let Some(is_pinned) = update.is_pinned {
            self.is_pinned = is_pinned;
        }
    }
}

/// Partial update for a note. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteUpdate {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub color: Option<NoteColor>,
    /// `Some(None)` moves the note back to the unfiled view.
    pub folder_id: Option<Option<FolderId>>,
    pub is_pinned: Option<bool>,
}

impl NoteUpdate {
    /// Update that moves a note to a new position.
    pub fn position(position: Point) -> Self {
        Self {
            x: Some(position.x),
            y: Some(position.y),
            ..Self::default()
        }
    }

    /// Update that replaces the note's bounds.
    pub fn bounds(bounds: Rect) -> Self {
        Self {
            x: Some(bounds.x0),
            y: Some(bounds.y0),
            width: Some(bounds.width()),
            height: Some(bounds.height()),
            ..Self::default()
        }
    }

    pub fn text(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            content: Some(content.into()),
            ..Self::default()
        }
    }
}
