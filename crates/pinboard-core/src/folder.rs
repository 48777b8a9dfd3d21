//! Folders and their card layout in the master view.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Unique folder identifier.
pub type FolderId = String;

/// Width of a folder card.
pub const FOLDER_CARD_WIDTH: f64 = 180.0;
/// Height of a folder card.
pub const FOLDER_CARD_HEIGHT: f64 = 200.0;
/// Gap between folder cards.
pub const FOLDER_CARD_SPACING: f64 = 32.0;
/// Cards per column before wrapping to the next column.
pub const FOLDERS_PER_COLUMN: usize = 4;
/// Top-left of the first folder card.
pub const FOLDER_GRID_ORIGIN: Point = Point::new(40.0, 60.0);
/// Base name for auto-named folders.
pub const DEFAULT_FOLDER_NAME: &str = "New Folder";

/// A folder of notes. Folders never nest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    /// Creation time in milliseconds since the Unix epoch.
    pub created_at: i64,
    /// Card position in the master view.
    pub x: f64,
    pub y: f64,
}

impl Folder {
    /// Create a folder stamped with the current time.
    pub fn new(name: impl Into<String>, position: Point) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            created_at: chrono::Utc::now().timestamp_millis(),
            x: position.x,
            y: position.y,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Card position for the folder at `index`, laid out column by column.
pub fn compute_folder_position(index: usize) -> Point {
    let column = (index / FOLDERS_PER_COLUMN) as f64;
    let row = (index % FOLDERS_PER_COLUMN) as f64;
    Point::new(
        FOLDER_GRID_ORIGIN.x + column * (FOLDER_CARD_WIDTH + FOLDER_CARD_SPACING),
        FOLDER_GRID_ORIGIN.y + row * (FOLDER_CARD_HEIGHT + FOLDER_CARD_SPACING),
    )
}

/// Pick a folder name that does not collide (case-insensitively) with existing ones.
///
/// Tries the base name, then "<base> 2", "<base> 3", ... up to 998, and finally
/// falls back to a timestamp suffix.
pub fn generate_folder_name(existing: &[Folder]) -> String {
    let taken: HashSet<String> = existing.iter().map(|f| f.name.to_lowercase()).collect();

    if !taken.contains(&DEFAULT_FOLDER_NAME.to_lowercase()) {
        return DEFAULT_FOLDER_NAME.to_string();
    }

    for counter in 2..999 {
        let candidate = format!("{DEFAULT_FOLDER_NAME} {counter}");
        if !taken.contains(&candidate.to_lowercase()) {
            return candidate;
        }
    }

    format!("{DEFAULT_FOLDER_NAME} {}", chrono::Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(name: &str) -> Folder {
        Folder::new(name, Point::ZERO)
    }

    #[test]
    fn test_first_folder_position() {
        assert_eq!(compute_folder_position(0), Point::new(40.0, 60.0));
    }

    #[test]
    fn test_second_folder_position() {
        assert_eq!(compute_folder_position(1), Point::new(40.0, 292.0));
    }

    #[test]
    fn test_new_column_position() {
        assert_eq!(compute_folder_position(4), Point::new(252.0, 60.0));
        assert_eq!(compute_folder_position(8), Point::new(464.0, 60.0));
    }

    #[test]
    fn test_name_without_collision() {
        assert_eq!(generate_folder_name(&[]), "New Folder");
        assert_eq!(generate_folder_name(&[folder("Work"), folder("Personal")]), "New Folder");
    }

    #[test]
    fn test_name_increments() {
        assert_eq!(generate_folder_name(&[folder("New Folder")]), "New Folder 2");
        assert_eq!(
            generate_folder_name(&[folder("New Folder"), folder("New Folder 2")]),
            "New Folder 3"
        );
    }

    #[test]
    fn test_name_is_case_insensitive() {
        assert_eq!(generate_folder_name(&[folder("NEW FOLDER")]), "New Folder 2");
    }

    #[test]
    fn test_name_fills_first_gap() {
        let existing = [folder("New Folder"), folder("New Folder 2"), folder("New Folder 4")];
        assert_eq!(generate_folder_name(&existing), "New Folder 3");
    }

    #[test]
    fn test_folder_json_shape() {
        let f = folder("Work");
        let value = serde_json::to_value(&f).unwrap();
        assert!(value["createdAt"].is_i64());
        assert_eq!(value["name"], "Work");
    }
}
