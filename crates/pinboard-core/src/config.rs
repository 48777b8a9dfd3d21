//! Tunable constants for the board engine.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::grid::GRID_SIZE;

/// Default alignment threshold in world units.
pub const DEFAULT_ALIGNMENT_THRESHOLD: f64 = 5.0;
/// Default number of history snapshots to keep.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;
/// Default quiet period before a burst of changes becomes one history entry.
pub const DEFAULT_HISTORY_DEBOUNCE_MS: u64 = 500;
/// Smallest width or height a note may have.
pub const MIN_NOTE_SIZE: f64 = 160.0;
/// Width and height of a freshly created note.
pub const DEFAULT_NOTE_SIZE: f64 = 240.0;
/// Lower zoom bound.
pub const MIN_ZOOM: f64 = 0.25;
/// Upper zoom bound.
pub const MAX_ZOOM: f64 = 3.0;
/// Zoom change per unit of wheel delta.
pub const WHEEL_ZOOM_SENSITIVITY: f64 = 0.001;
/// A marquee must exceed this size on both axes before it selects anything.
pub const MIN_MARQUEE_SIZE: f64 = 10.0;

/// Board configuration.
///
/// Every field has a default, so a partial JSON document only needs to name
/// the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoardConfig {
    /// Grid cell size used for snapping.
    pub grid_size: f64,
    /// Distance under which alignment guides activate.
    pub alignment_threshold: f64,
    /// Maximum number of undo snapshots.
    pub history_capacity: usize,
    /// Debounce window for history snapshots, in milliseconds.
    pub history_debounce_ms: u64,
    /// Minimum note width/height.
    pub min_note_size: f64,
    /// Size of new notes.
    pub default_note_size: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub wheel_zoom_sensitivity: f64,
    pub min_marquee_size: f64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            grid_size: GRID_SIZE,
            alignment_threshold: DEFAULT_ALIGNMENT_THRESHOLD,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            history_debounce_ms: DEFAULT_HISTORY_DEBOUNCE_MS,
            min_note_size: MIN_NOTE_SIZE,
            default_note_size: DEFAULT_NOTE_SIZE,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            wheel_zoom_sensitivity: WHEEL_ZOOM_SENSITIVITY,
            min_marquee_size: MIN_MARQUEE_SIZE,
        }
    }
}

impl BoardConfig {
    /// Load a configuration from JSON, filling missing fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// History debounce window as a duration.
    pub fn history_debounce(&self) -> Duration {
        Duration::from_millis(self.history_debounce_ms)
    }
}
