//! Viewport pan/zoom and screen/world conversion.

use kurbo::{Affine, Point, Size, Vec2};
use serde::{Deserialize, Serialize};

use crate::config::{BoardConfig, MAX_ZOOM, MIN_ZOOM};

/// Pan offset and zoom factor after a zoom operation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    /// Translation in screen units.
    pub pan: Vec2,
    /// Zoom factor.
    pub zoom: f64,
}

/// Convert a screen point to world coordinates: `(screen - pan) / zoom`.
pub fn screen_to_world(screen_point: Point, pan: Vec2, zoom: f64) -> Point {
    Point::new(
        (screen_point.x - pan.x) / zoom,
        (screen_point.y - pan.y) / zoom,
    )
}

/// Convert a world point to screen coordinates: `world * zoom + pan`.
pub fn world_to_screen(world_point: Point, pan: Vec2, zoom: f64) -> Point {
    Point::new(world_point.x * zoom + pan.x, world_point.y * zoom + pan.y)
}

/// Change the zoom by `delta_zoom`, keeping the world point under `cursor` fixed.
///
/// The new zoom is clamped to `[min_zoom, max_zoom]`. Non-finite deltas leave
/// the transform unchanged.
pub fn zoom_at(
    cursor: Point,
    delta_zoom: f64,
    pan: Vec2,
    zoom: f64,
    min_zoom: f64,
    max_zoom: f64,
) -> ViewTransform {
    if !delta_zoom.is_finite() {
        return ViewTransform { pan, zoom };
    }
    let new_zoom = (zoom + delta_zoom).clamp(min_zoom, max_zoom);
    let world = screen_to_world(cursor, pan, zoom);
    let new_pan = Vec2::new(cursor.x - world.x * new_zoom, cursor.y - world.y * new_zoom);
    ViewTransform {
        pan: new_pan,
        zoom: new_zoom,
    }
}

/// Viewport manages the view transform for the board.
///
/// It owns the pan offset (screen units) and the zoom factor, and converts
/// pointer positions into world coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    /// Current translation offset (pan).
    pub pan: Vec2,
    /// Current zoom level (1.0 = 100%).
    pub zoom: f64,
    /// Minimum allowed zoom level.
    pub min_zoom: f64,
    /// Maximum allowed zoom level.
    pub max_zoom: f64,
    /// Zoom change per unit of wheel delta.
    pub wheel_sensitivity: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            wheel_sensitivity: BoardConfig::default().wheel_zoom_sensitivity,
        }
    }
}

impl Viewport {
    /// Create a new viewport with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a viewport with explicit zoom bounds.
    pub fn with_bounds(min_zoom: f64, max_zoom: f64) -> Self {
        Self {
            min_zoom: min_zoom.min(max_zoom),
            max_zoom: max_zoom.max(min_zoom),
            ..Self::default()
        }
    }

    /// Create a viewport using the zoom settings of a board configuration.
    pub fn from_config(config: &BoardConfig) -> Self {
        Self {
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            wheel_sensitivity: config.wheel_zoom_sensitivity,
            ..Self::default()
        }
    }

    /// Get the affine transform for rendering (world to screen).
    pub fn transform(&self) -> Affine {
        Affine::translate(self.pan) * Affine::scale(self.zoom)
    }

    /// Get the inverse transform for input handling (screen to world).
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.pan)
    }

    /// Convert a screen point to world coordinates.
    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        screen_to_world(screen_point, self.pan, self.zoom)
    }

    /// Convert a world point to screen coordinates.
    pub fn world_to_screen(&self, world_point: Point) -> Point {
        world_to_screen(world_point, self.pan, self.zoom)
    }

    /// Pan the viewport by a delta in screen coordinates.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    /// Set the zoom directly, clamped to the allowed range.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        }
    }

    /// Zoom by an additive delta, keeping the given screen point fixed.
    pub fn zoom_at(&mut self, cursor: Point, delta_zoom: f64) {
        let next = zoom_at(cursor, delta_zoom, self.pan, self.zoom, self.min_zoom, self.max_zoom);
        self.pan = next.pan;
        self.zoom = next.zoom;
    }

    /// Zoom in response to a wheel event. Scrolling up (negative delta) zooms in.
    pub fn zoom_wheel(&mut self, cursor: Point, wheel_delta_y: f64) {
        self.zoom_at(cursor, -wheel_delta_y * self.wheel_sensitivity);
    }

    /// World point currently shown at the centre of a viewport of the given size.
    pub fn center_world(&self, viewport_size: Size) -> Point {
        self.screen_to_world(Point::new(viewport_size.width / 2.0, viewport_size.height / 2.0))
    }

    /// Grid line phase in screen space, for drawing a background grid that
    /// follows the pan offset.
    pub fn grid_phase(&self, grid_size: f64) -> Vec2 {
        let step = grid_size * self.zoom;
        if step <= 0.0 {
            return Vec2::ZERO;
        }
        Vec2::new(self.pan.x.rem_euclid(step), self.pan.y.rem_euclid(step))
    }

    /// Reset viewport to default position and zoom.
    pub fn reset(&mut self) {
        self.pan = Vec2::ZERO;
        self.zoom = 1.0;
    }
}
